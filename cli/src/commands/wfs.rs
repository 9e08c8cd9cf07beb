use anyhow::Result;
use tracing::info;
use urbdata::{download::WfsClient, fs::write_geojson};

use crate::{cli::{Cli, WfsCommand}, config::Config};

pub fn run(cli: &Cli, cmd: &WfsCommand) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?.wfs;
    if let WfsCommand::Fetch { page_size: Some(size), .. } = cmd {
        config.page_size = Some(*size);
    }
    let client = WfsClient::new(config)?;

    match cmd {
        WfsCommand::Types { filter } => {
            for ft in client.get_capabilities(filter.as_deref())? {
                println!("{}\t{}", ft.name, ft.title);
            }
        }
        WfsCommand::Schema { feature_type } => {
            for field in client.describe_feature_type(feature_type)? {
                let nullable = if field.nillable { "" } else { " not null" };
                println!("{}\t{}{nullable}", field.name, field.ty);
            }
        }
        WfsCommand::Count { feature_type } => {
            println!("{}", client.count_features(feature_type)?);
        }
        WfsCommand::Fetch { feature_type, output, output_format, .. } => {
            let layer = client.get_features(feature_type, output_format)?;
            info!(records = layer.len(), "writing {}", output.display());
            write_geojson(output, &layer, cli.force)?;
        }
    }
    Ok(())
}
