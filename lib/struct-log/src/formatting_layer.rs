use serde::ser::{SerializeMap, Serializer};
use serde_json::Map;
use std::io::Write;
use time::format_description::well_known::Rfc3339;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::fields::FieldSet;

/// Field names whose values never reach the output
pub const DEFAULT_REDACTED_FIELDS: [&str; 4] = ["token", "value", "password", "secret"];

const REDACTED: &str = "[redacted]";

const DATE: &str = "date";
const RUNTIME: &str = "runtime";
const APPLICATION: &str = "application";
const LEVEL: &str = "level";
const HOSTNAME: &str = "hostname";
const MESSAGE: &str = "message";
const LOGGER: &str = "logger";
const LINENO: &str = "lineno";
const FILE: &str = "file";
const VERSION: &str = "version";
const SPAN: &str = "span";

const RESERVED_FIELDS: [&str; 11] = [
    DATE,
    RUNTIME,
    APPLICATION,
    LEVEL,
    HOSTNAME,
    MESSAGE,
    LOGGER,
    LINENO,
    FILE,
    VERSION,
    SPAN,
];

/// Writes one JSON object per event, merging fields of the enclosing spans
pub struct JsonLogLayer<W: for<'a> MakeWriter<'a> + 'static> {
    make_writer: W,
    hostname: String,
    version: String,
    application: String,
    redacted: Vec<String>,
}

impl<W: for<'a> MakeWriter<'a> + 'static> JsonLogLayer<W> {
    pub fn new(application: String, version: String, make_writer: W) -> Self {
        let hostname = gethostname::gethostname().to_string_lossy().into_owned();
        Self::with_hostname(application, version, hostname, make_writer)
    }

    pub fn with_hostname(
        application: String,
        version: String,
        hostname: String,
        make_writer: W,
    ) -> Self {
        Self {
            make_writer,
            application,
            version,
            hostname,
            redacted: DEFAULT_REDACTED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Also mask these field names (compared case-insensitively)
    pub fn redact<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redacted
            .extend(fields.into_iter().map(|f| f.into().to_lowercase()));
        self
    }

    fn is_redacted(&self, key: &str) -> bool {
        self.redacted.iter().any(|f| f.eq_ignore_ascii_case(key))
    }

    fn serialize_core_fields(
        &self,
        map_serializer: &mut impl SerializeMap<Error = serde_json::Error>,
        message: &str,
        event: &Event<'_>,
    ) -> Result<(), std::io::Error> {
        let metadata = event.metadata();
        map_serializer.serialize_entry(RUNTIME, "rust")?;
        map_serializer.serialize_entry(APPLICATION, &self.application)?;
        map_serializer.serialize_entry(VERSION, &self.version)?;
        map_serializer.serialize_entry(HOSTNAME, &self.hostname)?;
        if let Ok(date) = &time::OffsetDateTime::now_utc().format(&Rfc3339) {
            map_serializer.serialize_entry(DATE, date)?;
        }
        map_serializer.serialize_entry(LEVEL, &metadata.level().as_str().to_lowercase())?;
        map_serializer.serialize_entry(LOGGER, metadata.target())?;
        map_serializer.serialize_entry(LINENO, &metadata.line())?;
        map_serializer.serialize_entry(FILE, &metadata.file())?;
        map_serializer.serialize_entry(MESSAGE, message)?;
        Ok(())
    }

    fn emit(&self, mut buffer: Vec<u8>) -> Result<(), std::io::Error> {
        buffer.write_all(b"\n")?;
        self.make_writer.make_writer().write_all(&buffer)
    }
}

impl<S, W> Layer<S> for JsonLogLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut event_fields = FieldSet::default();
        event.record(&mut event_fields);

        // Outer spans first so inner spans and the event itself win on conflicts.
        let mut extra = Map::new();
        let mut span_name = None;
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<FieldSet>() {
                    fields.merge_into(&mut extra, &RESERVED_FIELDS);
                }
                span_name = Some(span.name());
            }
        }
        event_fields.merge_into(&mut extra, &RESERVED_FIELDS);

        let format = || {
            let mut buffer = Vec::new();

            let mut serializer = serde_json::Serializer::new(&mut buffer);
            let mut map_serializer = serializer.serialize_map(None)?;

            let message = event_fields
                .message()
                .unwrap_or_else(|| event.metadata().target());
            self.serialize_core_fields(&mut map_serializer, message, event)?;
            if let Some(name) = span_name {
                map_serializer.serialize_entry(SPAN, name)?;
            }

            for (key, value) in &extra {
                if self.is_redacted(key) {
                    map_serializer.serialize_entry(key, REDACTED)?;
                } else {
                    map_serializer.serialize_entry(key, value)?;
                }
            }

            map_serializer.end()?;
            Ok(buffer)
        };

        let result: std::io::Result<Vec<u8>> = format();
        if let Ok(formatted) = result {
            let _ = self.emit(formatted);
        }
    }
}
