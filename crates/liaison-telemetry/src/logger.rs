//! Component-scoped structured logger.
//!
//! A [`Logger`] is keyed by a component name (a controller or middleware
//! name). It always writes through `tracing`, and forwards records at or
//! above a minimum level to an optional [`RemoteSink`] such as an error
//! reporting service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{SinkError, TelemetryError};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected but handled.
    Warn,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Returns the lowercase level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(TelemetryError::InvalidConfig(format!(
                "unknown log level: {other}"
            ))),
        }
    }
}

/// One structured record as seen by a remote sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// When the record was produced.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Component that produced the record.
    pub component: String,
    /// Message text.
    pub message: String,
    /// Structured fields.
    pub fields: Map<String, Value>,
}

/// Destination for forwarded log records.
///
/// Implementations must not block for long: `capture` is called inline on
/// the logging path. Buffer and ship asynchronously if the backend is slow.
pub trait RemoteSink: Send + Sync {
    /// Captures one record.
    fn capture(&self, record: &LogRecord) -> Result<(), SinkError>;
}

impl<F> RemoteSink for F
where
    F: Fn(&LogRecord) -> Result<(), SinkError> + Send + Sync,
{
    fn capture(&self, record: &LogRecord) -> Result<(), SinkError> {
        self(record)
    }
}

/// Structured logger keyed by a component name.
///
/// Cloning is cheap and shares the sink.
///
/// # Example
///
/// ```
/// use liaison_telemetry::Logger;
/// use serde_json::json;
///
/// let logger = Logger::new("ChannelController");
/// logger.info("Initializing controller", json!({ "operations": 3 }));
/// ```
#[derive(Clone)]
pub struct Logger {
    component: Arc<str>,
    sink: Option<Arc<dyn RemoteSink>>,
    remote_min_level: LogLevel,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("component", &self.component)
            .field("sink", &self.sink.is_some())
            .field("remote_min_level", &self.remote_min_level)
            .finish()
    }
}

impl Logger {
    /// Creates a logger that only writes locally.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: Arc::from(component.into()),
            sink: None,
            remote_min_level: LogLevel::Warn,
        }
    }

    /// Attaches a remote sink receiving records at or above `min_level`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn RemoteSink>, min_level: LogLevel) -> Self {
        self.sink = Some(sink);
        self.remote_min_level = min_level;
        self
    }

    /// Returns a logger for another component sharing this sink.
    #[must_use]
    pub fn for_component(&self, component: impl Into<String>) -> Self {
        Self {
            component: Arc::from(component.into()),
            sink: self.sink.clone(),
            remote_min_level: self.remote_min_level,
        }
    }

    /// Returns the component name.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Logs at debug level.
    pub fn debug(&self, message: &str, fields: Value) {
        self.log(LogLevel::Debug, message, fields);
    }

    /// Logs at info level.
    pub fn info(&self, message: &str, fields: Value) {
        self.log(LogLevel::Info, message, fields);
    }

    /// Logs at warn level.
    pub fn warn(&self, message: &str, fields: Value) {
        self.log(LogLevel::Warn, message, fields);
    }

    /// Logs at error level.
    pub fn error(&self, message: &str, fields: Value) {
        self.log(LogLevel::Error, message, fields);
    }

    /// Logs an error value with its source chain.
    ///
    /// Always forwarded to the sink, whatever its minimum level.
    pub fn exception(&self, error: &(dyn std::error::Error + 'static), fields: Value) {
        let mut fields = into_map(fields);
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(err) = source {
            chain.push(Value::String(err.to_string()));
            source = err.source();
        }
        fields.insert("error".to_string(), Value::String(error.to_string()));
        if !chain.is_empty() {
            fields.insert("caused_by".to_string(), Value::Array(chain));
        }

        let record = self.record(LogLevel::Error, &error.to_string(), fields);
        emit(&record);
        self.forward(&record);
    }

    fn log(&self, level: LogLevel, message: &str, fields: Value) {
        let record = self.record(level, message, into_map(fields));
        emit(&record);
        if level >= self.remote_min_level {
            self.forward(&record);
        }
    }

    fn record(&self, level: LogLevel, message: &str, fields: Map<String, Value>) -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            level,
            component: self.component.to_string(),
            message: message.to_string(),
            fields,
        }
    }

    fn forward(&self, record: &LogRecord) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.capture(record) {
                tracing::warn!(component = %record.component, error = %e, "failed to forward log record");
            }
        }
    }
}

fn into_map(fields: Value) -> Map<String, Value> {
    match fields {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}

fn emit(record: &LogRecord) {
    let component = record.component.as_str();
    let message = record.message.as_str();
    if record.fields.is_empty() {
        match record.level {
            LogLevel::Debug => tracing::debug!(component, "{message}"),
            LogLevel::Info => tracing::info!(component, "{message}"),
            LogLevel::Warn => tracing::warn!(component, "{message}"),
            LogLevel::Error => tracing::error!(component, "{message}"),
        }
        return;
    }

    let fields = Value::Object(record.fields.clone());
    match record.level {
        LogLevel::Debug => tracing::debug!(component, %fields, "{message}"),
        LogLevel::Info => tracing::info!(component, %fields, "{message}"),
        LogLevel::Warn => tracing::warn!(component, %fields, "{message}"),
        LogLevel::Error => tracing::error!(component, %fields, "{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Collect(Mutex<Vec<LogRecord>>);

    impl RemoteSink for Collect {
        fn capture(&self, record: &LogRecord) -> Result<(), SinkError> {
            self.0.lock().push(record.clone());
            Ok(())
        }
    }

    #[test]
    fn test_level_ordering_and_parse() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_forwards_at_or_above_min_level() {
        let sink = Arc::new(Collect::default());
        let logger = Logger::new("MessageController").with_sink(sink.clone(), LogLevel::Warn);

        logger.debug("noise", Value::Null);
        logger.info("started", json!({"flow_id": "f1"}));
        logger.warn("slow", json!({"duration_ms": 1200}));
        logger.error("failed", json!({}));

        let records = sink.0.lock();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "slow");
        assert_eq!(records[0].component, "MessageController");
        assert_eq!(records[0].fields["duration_ms"], json!(1200));
        assert_eq!(records[1].level, LogLevel::Error);
    }

    #[test]
    fn test_exception_includes_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("upload aborted")]
        struct Outer(#[source] std::io::Error);

        let sink = Arc::new(Collect::default());
        let logger = Logger::new("FileController").with_sink(sink.clone(), LogLevel::Error);
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "socket closed"));

        logger.exception(&err, json!({"file": "a.png"}));

        let records = sink.0.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields["error"], json!("upload aborted"));
        assert_eq!(records[0].fields["caused_by"], json!(["socket closed"]));
        assert_eq!(records[0].fields["file"], json!("a.png"));
    }

    #[test]
    fn test_closure_sink_and_failure_is_swallowed() {
        let sink: Arc<dyn RemoteSink> =
            Arc::new(|_: &LogRecord| Err(SinkError::Rejected("offline".to_string())));
        let logger = Logger::new("App").with_sink(sink, LogLevel::Debug);
        logger.error("still fine", Value::Null);
    }

    #[test]
    fn test_non_object_fields_are_wrapped() {
        let sink = Arc::new(Collect::default());
        let logger = Logger::new("App").with_sink(sink.clone(), LogLevel::Info);
        logger.info("scalar", json!(42));
        assert_eq!(sink.0.lock()[0].fields["data"], json!(42));
    }

    #[test]
    fn test_for_component_shares_sink() {
        let sink = Arc::new(Collect::default());
        let base = Logger::new("App").with_sink(sink.clone(), LogLevel::Info);
        let child = base.for_component("CachingMiddleware");
        child.info("hit", Value::Null);
        assert_eq!(child.component(), "CachingMiddleware");
        assert_eq!(sink.0.lock()[0].component, "CachingMiddleware");
    }
}
