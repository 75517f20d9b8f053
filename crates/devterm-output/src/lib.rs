// Output sinks and log-level plumbing for devterm
//
// Everything a terminal session prints flows through an `OutputSink`
// fan-out: the host console sink, the in-memory capture sink, and the
// channel sink the completion monitor blocks on.

mod channel;
mod host;
mod logger;
mod sink;
mod text;

// Re-export public API
pub use channel::ChannelOutput;
pub use host::{HostFormatter, HostOutput};
pub use logger::CommandLogger;
pub use sink::OutputSink;
pub use text::TextOutput;

use serde::{Deserialize, Serialize};

/// Default interval at which a blocked channel reader re-checks the queue
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Severity levels, ordered from most to least important.
///
/// A sink configured with a maximum level silently drops anything *above*
/// it, so `Error` always gets through and `Debug` only when explicitly
/// requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Message,
    Info,
    Verbose,
    Debug,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Message => write!(f, "message"),
            Self::Info => write!(f, "info"),
            Self::Verbose => write!(f, "verbose"),
            Self::Debug => write!(f, "debug"),
        }
    }
}

/// One captured fragment of process output, tagged with its level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMessage {
    pub level: LogLevel,
    pub message: String,
}

impl OutputMessage {
    pub fn new(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Message);
        assert!(LogLevel::Message < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Verbose);
        assert!(LogLevel::Verbose < LogLevel::Debug);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Error.to_string(), "error");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }
}
