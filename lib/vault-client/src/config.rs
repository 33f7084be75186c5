use crate::error::VaultError;
use std::fmt;
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 0;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Immutable connection settings shared by every request of a client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    address: String,
    token: String,
    max_retries: u32,
    retry_interval: Duration,
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Resolve everything from `VAULT_*` environment variables.
    pub fn from_env() -> Result<Self, VaultError> {
        ClientConfigBuilder::new().build()
    }

    /// Base address without a trailing slash, e.g. `http://127.0.0.1:8200`.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Additional attempts allowed after the first failed one.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn url_for(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("max_retries", &self.max_retries)
            .field("retry_interval", &self.retry_interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Default)]
pub struct ClientConfigBuilder {
    address: Option<String>,
    token: Option<String>,
    max_retries: Option<u32>,
    retry_interval: Option<Duration>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Some(interval);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fill unset values from the process environment and validate.
    pub fn build(self) -> Result<ClientConfig, VaultError> {
        self.resolve(|key| std::env::var(key).ok())
    }

    /// Same as [`build`](Self::build) with a custom variable lookup.
    pub fn resolve<F>(self, lookup: F) -> Result<ClientConfig, VaultError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = self
            .address
            .or_else(|| lookup("VAULT_ADDR"))
            .map(|a| a.trim().trim_end_matches('/').to_string())
            .filter(|a| !a.is_empty())
            .ok_or(VaultError::VaultNotDetected)?;

        let token = self
            .token
            .or_else(|| lookup("VAULT_TOKEN"))
            .filter(|t| !t.is_empty())
            .ok_or(VaultError::TokenNotConfigured)?;

        let max_retries = match self.max_retries {
            Some(n) => n,
            None => parse_var(&lookup, "VAULT_MAX_RETRIES")?.unwrap_or(DEFAULT_MAX_RETRIES),
        };

        let retry_interval = match self.retry_interval {
            Some(d) => d,
            None => parse_var(&lookup, "VAULT_RETRY_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_INTERVAL),
        };

        let timeout = match self.timeout {
            Some(d) => Some(d),
            None => parse_var(&lookup, "VAULT_TIMEOUT_SECS")?.map(Duration::from_secs),
        };

        Ok(ClientConfig {
            address,
            token,
            max_retries,
            retry_interval,
            timeout,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, VaultError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| VaultError::InvalidConfig(format!("{} has invalid value {:?}", key, raw))),
    }
}
