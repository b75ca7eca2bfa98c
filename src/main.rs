use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use spotter::{
    db::open,
    logging::{self, LogFormat},
    storage::Store,
    types::{Config, OutputFmt},
};

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::default_path()?;
    let cfg = Config::load(&config_path)?;

    let log_format = cfg
        .log_format()
        .map(LogFormat::parse)
        .transpose()?
        .unwrap_or_default();
    logging::init(cli.verbose, log_format)?;

    let fmt = OutputFmt::from_flag(cli.json);

    match cli.cmd {
        Commands::Config(cmd) => commands::config::handle(cmd, &config_path).await?,
        Commands::Import(cmd) => {
            let store = Store::new(open(&cfg.db_path()).await?);
            commands::import::handle(cmd, &store, &cfg, fmt).await?
        }
        Commands::Client(cmd) => {
            let store = Store::new(open(&cfg.db_path()).await?);
            commands::client::handle(cmd, &store, &cfg, fmt).await?
        }
    }

    Ok(())
}
