//! Write-only diagnostic sink the extractors report through.
//!
//! Extraction code never touches the global subscriber directly; it receives
//! an `Arc<dyn Diagnostics>` so tests can swap in [`RecordingDiagnostics`] and
//! assert on what was emitted. Replacing the sink never changes an extraction
//! outcome.

use std::sync::Mutex;

use serde_json::Value;
use tracing::Level;

pub trait Diagnostics: Send + Sync {
    fn debug(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards every event to `tracing` under the `luogu::extract` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "luogu::extract", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "luogu::extract", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "luogu::extract", "{message}");
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn debug(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<(Level, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Level, String)> {
        self.lock().clone()
    }

    /// Messages recorded at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn push(&self, level: Level, message: &str) {
        self.lock().push((level, message.to_string()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Level, String)>> {
        // A poisoned log is still a readable log.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn debug(&self, message: &str) {
        self.push(Level::DEBUG, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::ERROR, message);
    }
}

/// Pretty-print `value` for a log line, cut to at most `limit` characters.
pub fn snippet(value: &Value, limit: usize) -> String {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_default();
    match rendered.char_indices().nth(limit) {
        Some((cut, _)) => rendered[..cut].to_string(),
        None => rendered,
    }
}
