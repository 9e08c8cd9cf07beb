use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Municipal open-data and areal overlay CLI
#[derive(Parser, Debug)]
#[command(name = "urbdata", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON file with endpoint settings ({"catalog": {...}, "wfs": {...}})
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Overwrite output files that already exist
    #[arg(long, global = true)]
    pub force: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query the open-data catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Query the WFS feature service
    #[command(subcommand)]
    Wfs(WfsCommand),

    /// Areal-weighted interpolation of a source variable onto target zones
    Interpolate(InterpolateArgs),

    /// Remove vegetation and clip tracts to street blocks
    Tracts(TractsArgs),

    /// Map active risk areas onto subprefectures
    Risk(RiskArgs),

    /// Normalize subprefecture names in a text column
    Clean(CleanArgs),
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List package names
    Packages {
        /// Keep names containing this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// List the resources of a package
    Resources {
        package: String,

        /// Keep resources whose name contains this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Download a CSV/Excel resource and save it as CSV
    Fetch {
        url: String,

        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum WfsCommand {
    /// List feature types
    Types {
        /// Keep types whose name, title or abstract contains this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show the attribute schema of a feature type
    Schema { feature_type: String },

    /// Count the features of a feature type
    Count { feature_type: String },

    /// Download all features of a feature type as GeoJSON
    Fetch {
        feature_type: String,

        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: PathBuf,

        /// Features per request (overrides the configured page size)
        #[arg(long)]
        page_size: Option<usize>,

        #[arg(long, default_value = "application/json")]
        output_format: String,
    },
}

#[derive(Args, Debug)]
pub struct InterpolateArgs {
    /// Source layer (GeoJSON) holding the variable
    #[arg(value_hint = ValueHint::FilePath)]
    pub source: PathBuf,

    /// Target layer (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub target: PathBuf,

    /// Identifier column of the target layer
    #[arg(long)]
    pub id_col: String,

    /// Numeric variable of the source layer
    #[arg(long)]
    pub var: String,

    /// Name of the interpolated column (defaults to --var)
    #[arg(long)]
    pub final_name: Option<String>,

    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct TractsArgs {
    /// Census tracts (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub tracts: PathBuf,

    /// Vegetation cover to subtract (GeoJSON)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub vegetation: Option<PathBuf>,

    /// Street blocks to clip to (GeoJSON)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub street_blocks: Option<PathBuf>,

    /// Tract identifier column (defaults to the first attribute)
    #[arg(long)]
    pub id_col: Option<String>,

    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct RiskArgs {
    /// Risk areas (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub risk_areas: PathBuf,

    /// Subprefectures (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub subprefeituras: PathBuf,

    /// Text contained in the risk-grade column name
    #[arg(long)]
    pub grade_col_prefix: String,

    /// Grades starting with this text are active (case-insensitive)
    #[arg(long)]
    pub active_prefix: String,

    #[arg(long)]
    pub risk_id_col: Option<String>,

    #[arg(long)]
    pub subpref_id_col: Option<String>,

    /// Extra subprefecture columns to keep (repeatable)
    #[arg(long = "subpref-col")]
    pub subpref_cols: Vec<String>,

    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Layer (GeoJSON) holding the names
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Text column to normalize in place
    #[arg(long)]
    pub column: String,

    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}
