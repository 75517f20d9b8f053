use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::{LogLevel, OutputSink};

/// In-memory capture sink.
///
/// Regular output and error output accumulate in separate buffers; the
/// accessors return trimmed text. One instance serves as the per-run-unit
/// accumulation buffer and gets reset between run units.
pub struct TextOutput {
    output: Mutex<String>,
    error: Mutex<String>,
    enabled: AtomicBool,
}

impl TextOutput {
    pub fn new() -> Self {
        Self {
            output: Mutex::new(String::new()),
            error: Mutex::new(String::new()),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Accumulated non-error output, trimmed.
    pub fn output(&self) -> String {
        self.output.lock().unwrap().trim().to_string()
    }

    /// Accumulated error output, trimmed.
    pub fn error(&self) -> String {
        self.error.lock().unwrap().trim().to_string()
    }

    /// Discard everything captured so far.
    pub fn reset(&self) {
        self.output.lock().unwrap().clear();
        self.error.lock().unwrap().clear();
    }
}

impl Default for TextOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for TextOutput {
    fn write(&self, message: &str, level: LogLevel) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        if level == LogLevel::Error {
            self.error.lock().unwrap().push_str(message);
        } else {
            self.output.lock().unwrap().push_str(message);
        }
    }
}
