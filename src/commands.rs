use crate::cli::Command;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use vault_client::VaultClient;

/// Run one command and return what should be printed on stdout.
pub async fn execute(client: &VaultClient, command: &Command) -> Result<String> {
    match command {
        Command::Read { path, field } => {
            let response = client
                .read(path)
                .await
                .with_context(|| format!("Failed to read secret at {}", path))?;
            tracing::info!(path = %path, retries = response.retries(), "Read secret");

            match field {
                Some(field) => response
                    .data()
                    .get(field)
                    .cloned()
                    .with_context(|| format!("No field {:?} at {}", field, path)),
                None => {
                    let sorted: BTreeMap<_, _> = response.into_data().into_iter().collect();
                    Ok(serde_json::to_string_pretty(&sorted)?)
                }
            }
        }
        Command::Write { path, value } => {
            let response = client
                .write(path, value)
                .await
                .with_context(|| format!("Failed to write secret at {}", path))?;
            tracing::info!(path = %path, retries = response.retries(), "Wrote secret");
            Ok(format!("Success! Data written to: {}", path))
        }
    }
}
