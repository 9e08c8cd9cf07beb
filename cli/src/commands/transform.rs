use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use urbdata::{
    clean_subprefeitura_column, fs::{read_geojson, write_geojson},
    interpolate_areal_weighted, prepare_risk_area, prepare_tracts, Layer, RiskAreaOptions,
};

use crate::cli::{CleanArgs, Cli, InterpolateArgs, RiskArgs, TractsArgs};

fn read_optional(path: Option<&Path>) -> Result<Option<Layer>> {
    path.map(read_geojson).transpose()
}

fn write(cli: &Cli, output: &Path, layer: &Layer) -> Result<()> {
    info!(records = layer.len(), "writing {}", output.display());
    write_geojson(output, layer, cli.force)
}

pub fn interpolate(cli: &Cli, args: &InterpolateArgs) -> Result<()> {
    let source = read_geojson(&args.source)?;
    let target = read_geojson(&args.target)?;

    let result = interpolate_areal_weighted(&source, &target, &args.id_col, &args.var, args.final_name.as_deref())
        .with_context(|| format!("interpolate {} onto {}", args.var, args.target.display()))?;
    write(cli, &args.output, &result)
}

pub fn tracts(cli: &Cli, args: &TractsArgs) -> Result<()> {
    let tracts = read_geojson(&args.tracts)?;
    let vegetation = read_optional(args.vegetation.as_deref())?;
    let street_blocks = read_optional(args.street_blocks.as_deref())?;

    let result = prepare_tracts(&tracts, vegetation.as_ref(), street_blocks.as_ref(), args.id_col.as_deref())
        .context("prepare tracts")?;
    write(cli, &args.output, &result)
}

pub fn risk(cli: &Cli, args: &RiskArgs) -> Result<()> {
    let risk_areas = read_geojson(&args.risk_areas)?;
    let subprefeituras = read_geojson(&args.subprefeituras)?;

    let mut options = RiskAreaOptions::new(&args.grade_col_prefix, &args.active_prefix)
        .with_subprefeitura_additional_cols(&args.subpref_cols);
    if let Some(col) = &args.risk_id_col { options = options.with_risk_area_id_col(col) }
    if let Some(col) = &args.subpref_id_col { options = options.with_subprefeitura_id_col(col) }

    let result = prepare_risk_area(&risk_areas, &subprefeituras, &options)
        .context("map risk areas onto subprefectures")?;
    write(cli, &args.output, &result)
}

pub fn clean(cli: &Cli, args: &CleanArgs) -> Result<()> {
    let layer = read_geojson(&args.input)?;
    let cleaned = clean_subprefeitura_column(layer.column(&args.column)?)?;
    write(cli, &args.output, &layer.with_column(cleaned)?)
}
