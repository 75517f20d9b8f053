use std::sync::{Arc, Mutex};

use crate::{LogLevel, OutputSink};

/// Fan-out registry for output sinks.
///
/// The process reader threads call `log_output`/`log_error` with complete
/// lines; every registered sink receives each line in registration order.
/// The current level tags regular output so run-unit level overrides
/// propagate to all sinks at once.
pub struct CommandLogger {
    level: Mutex<LogLevel>,
    sinks: Mutex<Vec<Arc<dyn OutputSink>>>,
}

impl CommandLogger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: Mutex::new(level),
            sinks: Mutex::new(Vec::new()),
        }
    }

    pub fn log_level(&self) -> LogLevel {
        *self.level.lock().unwrap()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        *self.level.lock().unwrap() = level;
    }

    /// Register a sink. Sinks may be added while a session is live; the
    /// next fan-out call picks them up.
    pub fn add(&self, sink: Arc<dyn OutputSink>) {
        self.sinks.lock().unwrap().push(sink);
    }

    /// Forward one line of process stdout to every sink at the current level.
    pub fn log_output(&self, line: &str) {
        let level = self.log_level();
        for sink in self.sinks.lock().unwrap().iter() {
            sink.write_line(line, level);
        }
    }

    /// Forward one line of process stderr to every sink at `Error`.
    pub fn log_error(&self, line: &str) {
        for sink in self.sinks.lock().unwrap().iter() {
            sink.write_line(line, LogLevel::Error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextOutput;

    #[test]
    fn test_fans_out_to_every_sink() {
        let logger = CommandLogger::new(LogLevel::Info);
        let first = Arc::new(TextOutput::new());
        let second = Arc::new(TextOutput::new());
        logger.add(first.clone());
        logger.add(second.clone());

        logger.log_output("shared line");

        assert_eq!(first.output(), "shared line");
        assert_eq!(second.output(), "shared line");
    }

    #[test]
    fn test_errors_are_tagged_as_error_level() {
        let logger = CommandLogger::new(LogLevel::Info);
        let sink = Arc::new(TextOutput::new());
        logger.add(sink.clone());

        logger.log_error("went wrong");

        assert_eq!(sink.output(), "");
        assert_eq!(sink.error(), "went wrong");
    }

    #[test]
    fn test_level_override_applies_to_output() {
        let logger = CommandLogger::new(LogLevel::Info);
        assert_eq!(logger.log_level(), LogLevel::Info);
        logger.set_log_level(LogLevel::Debug);
        assert_eq!(logger.log_level(), LogLevel::Debug);
    }
}
