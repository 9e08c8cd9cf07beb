mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

/// `RUST_LOG` wins; otherwise -v picks warn/info/debug.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Catalog(cmd) => commands::catalog(&cli, cmd),
        Commands::Wfs(cmd) => commands::wfs(&cli, cmd),
        Commands::Interpolate(args) => commands::interpolate(&cli, args),
        Commands::Tracts(args) => commands::tracts(&cli, args),
        Commands::Risk(args) => commands::risk(&cli, args),
        Commands::Clean(args) => commands::clean(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
