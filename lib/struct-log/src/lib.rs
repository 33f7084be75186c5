mod builder;
mod error;
mod fields;
mod formatting_layer;

pub use builder::StructLogBuilder;
pub use error::SetupError;
pub use formatting_layer::{JsonLogLayer, DEFAULT_REDACTED_FIELDS};
pub use fields::{FieldSet, SpanFieldsLayer};
pub use tracing_appender::non_blocking::WorkerGuard;
