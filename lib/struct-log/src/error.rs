use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    /// The `log` crate bridge was installed by someone else.
    #[error("log tracer already initialized")]
    LogTracerAlreadyInitialized,

    #[error("global tracing subscriber already set")]
    SubscriberAlreadySet,

    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}
