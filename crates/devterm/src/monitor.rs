use std::sync::Arc;

use devterm_output::{ChannelOutput, CommandLogger, HostOutput, LogLevel, OutputSink, TextOutput};

use crate::wildcard::match_wildcard;
use crate::{Result, TerminalError};

/// Watches the output channel for the end-of-command sentinel while
/// forwarding genuine output to the capture and console sinks.
///
/// Per line the loop is a small state machine: empty lines and lines
/// matching a skip wildcard (the shell echoing its own input) are
/// dropped, a line matching the end wildcard completes the wait, and
/// everything else is accepted output.
pub struct TerminalMonitor {
    channel: Arc<ChannelOutput>,
    text: Arc<TextOutput>,
    host: Arc<HostOutput>,
    trim_lines: bool,
}

impl TerminalMonitor {
    pub fn new(text: Arc<TextOutput>, host: Arc<HostOutput>) -> Self {
        Self::with_trim_lines(text, host, true)
    }

    /// A monitor that forwards accepted lines with their terminators
    /// intact instead of stripping them.
    pub fn with_trim_lines(text: Arc<TextOutput>, host: Arc<HostOutput>, trim_lines: bool) -> Self {
        Self {
            channel: Arc::new(ChannelOutput::new()),
            text,
            host,
            trim_lines,
        }
    }

    /// Register the channel sink on the logger that receives process
    /// output. Must happen before the first run unit.
    pub fn attach(&self, logger: &CommandLogger) {
        logger.add(self.channel.clone());
    }

    /// The channel the completion loop blocks on.
    pub fn channel(&self) -> &Arc<ChannelOutput> {
        &self.channel
    }

    pub fn host(&self) -> &Arc<HostOutput> {
        &self.host
    }

    /// Output accepted since the last reset, trimmed.
    pub fn output(&self) -> String {
        self.text.output()
    }

    /// Clear the accumulation sink for the next run unit.
    pub fn reset(&self) {
        self.text.reset();
    }

    /// Write an observability message to the host sink only; never part
    /// of completion detection.
    pub fn write_host_line(&self, message: &str, level: LogLevel) {
        self.host.write_line(message, level);
    }

    /// Block until a line matching `end_wildcard` arrives and return that
    /// line with its terminator stripped.
    pub fn wait_for_result(&self, end_wildcard: &str, skip_wildcards: &[String]) -> Result<String> {
        if end_wildcard.is_empty() {
            return Err(TerminalError::InvalidArgument(
                "end monitoring wildcard is required",
            ));
        }

        loop {
            let received = self.channel.wait_and_read();
            let line = strip_line_terminator(&received.message);
            if line.is_empty() {
                continue;
            }

            if match_wildcard(line, end_wildcard) {
                return Ok(line.to_string());
            }

            if skip_wildcards.iter().any(|card| match_wildcard(line, card)) {
                continue;
            }

            let message = if self.trim_lines {
                line
            } else {
                received.message.as_str()
            };
            self.text.write_line(message, received.level);
            self.host.write_line(message, received.level);
        }
    }
}

/// Strip a single trailing line terminator (`\n` or `\r\n`).
fn strip_line_terminator(input: &str) -> &str {
    match input.strip_suffix('\n') {
        Some(stripped) => stripped.strip_suffix('\r').unwrap_or(stripped),
        None => input,
    }
}
