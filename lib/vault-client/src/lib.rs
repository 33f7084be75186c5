//! vault-client - logical read/write client for HashiCorp Vault
//!
//! Reads flat `{field: value}` secrets with `GET /v1/<path>` and stores a
//! single `value` field with `POST /v1/<path>`, retrying any failure up to
//! `max_retries` times with a fixed delay.
//!
//! Configuration comes from the builder or `VAULT_ADDR`, `VAULT_TOKEN`,
//! `VAULT_MAX_RETRIES`, `VAULT_RETRY_INTERVAL_MS` and `VAULT_TIMEOUT_SECS`.

mod client;
mod config;
mod envelope;
mod error;
mod models;
pub mod retry;
pub mod transport;

pub use client::VaultClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{AttemptError, TransportError, VaultError};
pub use models::{LogicalResponse, Secret};
pub use retry::{Interrupted, Sleep, TokioSleep};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
