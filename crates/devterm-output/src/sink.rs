use crate::LogLevel;

/// A destination for captured output.
///
/// Implementations take `&self` and carry their own interior locking so
/// the process reader threads can fan out to several sinks without an
/// outer mutex. Fan-out within one logger call is sequential, so sinks
/// never observe interleaved fragments of the same line.
pub trait OutputSink: Send + Sync {
    /// Write a message fragment without a line terminator.
    fn write(&self, message: &str, level: LogLevel);

    /// Write a message followed by a line terminator.
    fn write_line(&self, message: &str, level: LogLevel) {
        self.write(&format!("{message}\n"), level);
    }

    /// Write a bare line terminator.
    fn blank_line(&self) {
        self.write("\n", LogLevel::Message);
    }
}
