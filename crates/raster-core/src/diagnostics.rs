//! Diagnostic message sinks.
//!
//! Codecs and long operations report non-fatal conditions (a fallback decode
//! path, a dropped metadata chunk, a lossy conversion on save) through a
//! [`DiagnosticSink`]. The sink is passed in through configuration, so two
//! engines in one process never share it. Reporting never changes the result
//! of the operation.
//!
//! ```rust
//! use raster_core::diagnostics::{CollectingSink, DiagnosticSink};
//!
//! let sink = CollectingSink::default();
//! sink.report(Some("png"), "16-bit palette not supported, expanding");
//! assert_eq!(sink.entries()[0].format.as_deref(), Some("png"));
//! ```

use std::sync::Mutex;

/// One reported message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Format the engine was handling, if any.
    pub format: Option<String>,
    /// Message text.
    pub message: String,
}

/// Receiver for diagnostic messages.
pub trait DiagnosticSink: Send + Sync {
    /// Records a message about `format`.
    fn report(&self, format: Option<&str>, message: &str);
}

/// Forwards messages to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, format: Option<&str>, message: &str) {
        tracing::warn!(format = format.unwrap_or("unknown"), "{message}");
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _format: Option<&str>, _message: &str) {}
}

/// Stores messages in memory, mostly for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Snapshot of the messages received so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of messages received.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns true when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, format: Option<&str>, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Diagnostic {
                format: format.map(str::to_string),
                message: message.to_string(),
            });
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(Option<&str>, &str) + Send + Sync,
{
    fn report(&self, format: Option<&str>, message: &str) {
        self(format, message)
    }
}
