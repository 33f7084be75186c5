pub mod cli;
pub mod commands;

use struct_log::{SetupError, StructLogBuilder, WorkerGuard};

/// Install logging for the CLI; keep the guard alive until exit.
pub fn setup_logging(
    json: bool,
    filter: Option<&str>,
) -> Result<Option<WorkerGuard>, SetupError> {
    let mut builder = StructLogBuilder::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if let Some(directives) = filter {
        builder = builder.filter(directives);
    }
    let builder = if json {
        builder.json_enabled(true)
    } else {
        builder.json_from_env()
    };
    builder.init()
}
