use anyhow::Result;
use tracing::info;
use urbdata::{download::CatalogClient, fs::write_csv};

use crate::{cli::{CatalogCommand, Cli}, config::Config};

pub fn run(cli: &Cli, cmd: &CatalogCommand) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let client = CatalogClient::new(config.catalog)?;

    match cmd {
        CatalogCommand::Packages { filter } => {
            for name in client.package_list(filter.as_deref())? {
                println!("{name}");
            }
        }
        CatalogCommand::Resources { package, filter } => {
            for link in client.package_resources(package, filter.as_deref())? {
                println!("{}\t{}", link.name, link.url);
            }
        }
        CatalogCommand::Fetch { url, output } => {
            let mut df = client.fetch_resource(url)?;
            info!(rows = df.height(), columns = df.width(), "writing {}", output.display());
            write_csv(output, &mut df, cli.force)?;
        }
    }
    Ok(())
}
