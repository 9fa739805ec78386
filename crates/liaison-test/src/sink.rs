//! In-memory remote log sink.

use std::sync::Arc;

use liaison_telemetry::{LogLevel, LogRecord, Logger, RemoteSink, SinkError};
use parking_lot::Mutex;

/// A [`RemoteSink`] that keeps every record it receives.
///
/// # Example
///
/// ```
/// use liaison_telemetry::LogLevel;
/// use liaison_test::MemorySink;
/// use serde_json::json;
///
/// let sink = MemorySink::new();
/// let logger = sink.logger("UserController", LogLevel::Debug);
/// logger.info("Initializing controller", json!({}));
///
/// assert!(sink.contains("Initializing controller"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a logger for `component` forwarding into this sink.
    #[must_use]
    pub fn logger(&self, component: &str, min_level: LogLevel) -> Logger {
        Logger::new(component).with_sink(self.shared(), min_level)
    }

    /// Returns this sink as a shared trait object.
    #[must_use]
    pub fn shared(&self) -> Arc<dyn RemoteSink> {
        Arc::new(self.clone())
    }

    /// Returns every captured record.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns the captured messages in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Returns the records of one level.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Returns whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records.lock().iter().any(|r| r.message.contains(needle))
    }

    /// Returns the number of captured records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drops every captured record.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl RemoteSink for MemorySink {
    fn capture(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}
