use clap::{Parser, Subcommand};
use std::time::Duration;
use vault_client::{ClientConfig, VaultError};

/// Read and write flat secrets in HashiCorp Vault
#[derive(Debug, Parser)]
#[command(name = "vault-logical", version)]
pub struct Cli {
    /// Vault address, e.g. http://127.0.0.1:8200
    #[arg(long, env = "VAULT_ADDR", global = true)]
    pub address: Option<String>,

    /// Token sent as X-Vault-Token
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Extra attempts after a failed request
    #[arg(long, env = "VAULT_MAX_RETRIES", global = true)]
    pub max_retries: Option<u32>,

    /// Fixed pause between attempts, in milliseconds
    #[arg(long, env = "VAULT_RETRY_INTERVAL_MS", global = true)]
    pub retry_interval_ms: Option<u64>,

    /// Log as JSON lines (also enabled by JSON_LOG=true)
    #[arg(long, global = true)]
    pub json_log: bool,

    /// Log filter directives, e.g. `vault_client=debug` (RUST_LOG otherwise)
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the secret stored at PATH as JSON
    Read {
        /// Secret path, e.g. secret/hello
        path: String,

        /// Print only this field, without quoting
        #[arg(short, long)]
        field: Option<String>,
    },
    /// Store VALUE at PATH under the `value` field
    Write { path: String, value: String },
}

impl Cli {
    /// Flags win; anything unset falls back to the VAULT_* environment.
    pub fn client_config(&self) -> Result<ClientConfig, VaultError> {
        let mut builder = ClientConfig::builder();
        if let Some(address) = &self.address {
            builder = builder.address(address);
        }
        if let Some(token) = &self.token {
            builder = builder.token(token);
        }
        if let Some(max_retries) = self.max_retries {
            builder = builder.max_retries(max_retries);
        }
        if let Some(ms) = self.retry_interval_ms {
            builder = builder.retry_interval(Duration::from_millis(ms));
        }
        builder.build()
    }
}
