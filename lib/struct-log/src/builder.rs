use std::env;
use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::error::SetupError;
use crate::formatting_layer::JsonLogLayer;
use crate::fields::SpanFieldsLayer;

/// Builder for configuring process-wide logging.
///
/// Output always goes to stderr; stdout is left to the program.
pub struct StructLogBuilder {
    application: String,
    version: String,
    json_enabled: bool,
    filter: Option<String>,
}

impl StructLogBuilder {
    /// Create a new builder with required application name and version
    pub fn new(application: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            version: version.into(),
            json_enabled: false,
            filter: None,
        }
    }

    /// Enable or disable JSON output (defaults to false)
    pub fn json_enabled(mut self, enabled: bool) -> Self {
        self.json_enabled = enabled;
        self
    }

    /// Read JSON_LOG env var to determine if JSON should be enabled
    pub fn json_from_env(mut self) -> Self {
        self.json_enabled = env::var("JSON_LOG").is_ok_and(|s| s.parse().unwrap_or_default());
        self
    }

    /// Filter directives such as `info,vault_client=debug`; `RUST_LOG` otherwise
    pub fn filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = Some(directives.into());
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, SetupError> {
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives)
                .map_err(|e| SetupError::InvalidFilter(e.to_string())),
            None => Ok(EnvFilter::from_default_env()),
        }
    }

    /// Install the global subscriber.
    ///
    /// In JSON mode the returned guard must be kept alive until exit so
    /// buffered lines are flushed.
    pub fn init(self) -> Result<Option<WorkerGuard>, SetupError> {
        let filter = self.env_filter()?;

        if !self.json_enabled {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init()
                .map_err(|_| SetupError::SubscriberAlreadySet)?;
            return Ok(None);
        }

        LogTracer::init().map_err(|_| SetupError::LogTracerAlreadyInitialized)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(io::stderr());

        let layer = JsonLogLayer::new(self.application, self.version, non_blocking);

        let subscriber = Registry::default()
            .with(filter)
            .with(SpanFieldsLayer)
            .with(layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|_| SetupError::SubscriberAlreadySet)?;

        Ok(Some(guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = StructLogBuilder::new("vault-logical", "0.1.0");
        assert!(!builder.json_enabled);
        assert!(builder.filter.is_none());
    }

    #[test]
    fn test_invalid_filter_is_reported() {
        let builder = StructLogBuilder::new("app", "1").filter("vault_client=notalevel");
        assert!(matches!(
            builder.env_filter(),
            Err(SetupError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_valid_filter() {
        let builder = StructLogBuilder::new("app", "1").filter("info,vault_client=debug");
        assert!(builder.env_filter().is_ok());
    }
}
