use crate::config::ClientConfig;
use crate::envelope;
use crate::error::{AttemptError, VaultError};
use crate::models::LogicalResponse;
use crate::retry::{RetryError, RetryExecutor, RetryPolicy, Sleep};
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Body of a logical write; only the single legacy `value` field is sent.
#[derive(Serialize)]
struct WriteBody<'a> {
    value: &'a str,
}

/// Reads and writes flat secrets through Vault's `/v1/<path>` API.
///
/// Holds no per-call state, so one instance can serve concurrent callers.
#[derive(Clone)]
pub struct VaultClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    retry: RetryExecutor,
}

impl VaultClient {
    /// Client over the default reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self, VaultError> {
        let transport = match config.timeout() {
            Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
            None => ReqwestTransport::new(),
        };
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn from_env() -> Result<Self, VaultError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let retry = RetryExecutor::new(RetryPolicy::from(&config));
        Self {
            config: Arc::new(config),
            transport,
            retry,
        }
    }

    /// Replace how the client waits between attempts.
    pub fn with_sleep(mut self, sleep: Arc<dyn Sleep>) -> Self {
        self.retry = self.retry.with_sleep(sleep);
        self
    }

    /// Stop retrying once `token` is cancelled.
    ///
    /// Without a token an interrupted delay is skipped and the loop keeps
    /// going until the retry budget is spent.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.retry = self.retry.with_cancellation(token);
        self
    }

    /// Read all string fields stored at `path` (e.g. `secret/hello`).
    #[tracing::instrument(skip_all, fields(path = %path))]
    pub async fn read(&self, path: &str) -> Result<LogicalResponse, VaultError> {
        validate_path(path)?;
        let url = self.config.url_for(path);

        let outcome = self
            .retry
            .run(|| {
                let request = HttpRequest::new(Method::Get, url.as_str())
                    .header(TOKEN_HEADER, self.config.token());
                async move {
                    let response = self.send(request).await?;
                    let data = envelope::parse_read(&response)?;
                    Ok::<_, AttemptError>((response, data))
                }
            })
            .await
            .map_err(into_vault_error)?;

        let (response, data) = outcome.value;
        tracing::debug!(retries = outcome.retries, fields = data.len(), "Secret read");
        Ok(LogicalResponse::read(response, outcome.retries, data))
    }

    /// Store `value` under the `value` field at `path`.
    #[tracing::instrument(skip_all, fields(path = %path))]
    pub async fn write(&self, path: &str, value: &str) -> Result<LogicalResponse, VaultError> {
        validate_path(path)?;
        let url = self.config.url_for(path);
        let body = serde_json::to_vec(&WriteBody { value })?;

        let outcome = self
            .retry
            .run(|| {
                let request = HttpRequest::new(Method::Post, url.as_str())
                    .header(TOKEN_HEADER, self.config.token())
                    .header("Content-Type", "application/json")
                    .body(body.clone());
                async move {
                    let response = self.send(request).await?;
                    envelope::expect_status(&response, 204)
                }
            })
            .await
            .map_err(into_vault_error)?;

        tracing::debug!(retries = outcome.retries, "Secret written");
        Ok(LogicalResponse::written(outcome.retries))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AttemptError> {
        tracing::debug!(method = ?request.method, url = %request.url, "Sending Vault request");
        let response = self.transport.execute(request).await?;
        Ok(response)
    }
}

fn validate_path(path: &str) -> Result<(), VaultError> {
    if path.trim().is_empty() {
        return Err(VaultError::InvalidPath(path.to_string()));
    }
    Ok(())
}

fn into_vault_error(err: RetryError<AttemptError>) -> VaultError {
    match err {
        RetryError::Exhausted {
            attempts,
            last_error,
        } => {
            tracing::error!(
                attempts,
                kind = last_error.kind(),
                error = %last_error,
                "Giving up on Vault request"
            );
            VaultError::RequestFailed {
                attempts,
                source: last_error,
            }
        }
        RetryError::Cancelled { attempts } => VaultError::Cancelled { attempts },
    }
}
