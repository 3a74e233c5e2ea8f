use std::sync::Mutex;

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One-way notification channel towards whatever renders status to the user.
pub trait StatusSink: Send + Sync {
    fn announce(&self, message: &str, severity: Severity);
}

/// Writes status through the log.
#[derive(Debug, Default)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn announce(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(target: "status", "{}", message),
            Severity::Warning => warn!(target: "status", "{}", message),
            Severity::Error => error!(target: "status", "{}", message),
        }
    }
}

/// Keeps every announcement; handy for assertions.
#[derive(Debug, Default)]
pub struct RecordingStatusSink {
    entries: Mutex<Vec<(String, Severity)>>,
}

impl RecordingStatusSink {
    pub fn entries(&self) -> Vec<(String, Severity)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl StatusSink for RecordingStatusSink {
    fn announce(&self, message: &str, severity: Severity) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((message.to_string(), severity));
        }
    }
}
