#![warn(rust_2018_idioms)]

use anyhow::{Context, Result};
use clap::Parser;

use vault_client::VaultClient;
use vault_logical::cli::Cli;
use vault_logical::{commands, setup_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.json_log, cli.log_filter.as_deref())?;

    let config = cli
        .client_config()
        .context("Failed to resolve Vault configuration")?;
    tracing::debug!(?config, "Resolved Vault configuration");

    let client = VaultClient::new(config).context("Failed to create Vault client")?;
    let output = commands::execute(&client, &cli.command).await?;
    println!("{}", output);
    Ok(())
}
