use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use colored::Colorize;

use crate::{LogLevel, OutputSink};

/// Raw color codes some tools emit into their output; stripped before
/// the host applies its own level coloring.
const RAW_COLOR_CODES: [&str; 5] = [
    "\u{1b}[0m",
    "\u{1b}[32m",
    "\u{1b}[39m",
    "\u{1b}[94m",
    "\u{1b}[96m",
];

/// Formats host console lines: optional `prefix:` label, per-level
/// indentation and level coloring via `colored`.
pub struct HostFormatter {
    prefix: String,
    offset_ratio: usize,
    no_color: bool,
}

impl HostFormatter {
    pub fn new(prefix: &str, offset_ratio: usize, no_color: bool) -> Self {
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}:")
        };
        Self {
            prefix,
            offset_ratio,
            no_color,
        }
    }

    /// Color a message for its level.
    pub fn format_message(&self, message: &str, level: LogLevel) -> String {
        if self.no_color {
            return message.to_string();
        }
        match level {
            LogLevel::Error => message.red().to_string(),
            LogLevel::Message => message.normal().to_string(),
            LogLevel::Info => message.green().to_string(),
            LogLevel::Verbose => message.bright_blue().to_string(),
            LogLevel::Debug => message.bright_black().to_string(),
        }
    }

    /// Label and indentation written at the start of a physical line.
    pub fn line_prefix(&self, level: LogLevel) -> String {
        let offset = " ".repeat(level as usize * self.offset_ratio);
        if self.no_color || self.prefix.is_empty() {
            format!("{}{}", self.prefix, offset)
        } else {
            format!("{}{}", self.prefix.cyan(), offset)
        }
    }
}

impl Default for HostFormatter {
    fn default() -> Self {
        Self::new("", 1, false)
    }
}

struct WriterState {
    writer: Box<dyn Write + Send>,
    line_start: bool,
}

/// Console sink with level filtering and line prefixing.
///
/// Messages above the configured maximum level are silently dropped.
/// The writer is pluggable so tests can capture host output in a shared
/// buffer instead of stdout.
pub struct HostOutput {
    state: Mutex<WriterState>,
    formatter: HostFormatter,
    max_level: LogLevel,
    enabled: AtomicBool,
}

impl HostOutput {
    pub fn new(writer: Box<dyn Write + Send>, max_level: LogLevel, formatter: HostFormatter) -> Self {
        Self {
            state: Mutex::new(WriterState {
                writer,
                line_start: true,
            }),
            formatter,
            max_level,
            enabled: AtomicBool::new(true),
        }
    }

    /// Host output wired to the process's stdout.
    pub fn stdout(max_level: LogLevel, formatter: HostFormatter) -> Self {
        Self::new(Box::new(io::stdout()), max_level, formatter)
    }

    /// Host output writing into a shared in-memory buffer, for tests.
    pub fn buffered(max_level: LogLevel, formatter: HostFormatter) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = SharedBuffer(Arc::clone(&buffer));
        (Self::new(Box::new(writer), max_level, formatter), buffer)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn strip_raw_colors(message: &str) -> String {
        let mut cleaned = message.to_string();
        for code in RAW_COLOR_CODES {
            cleaned = cleaned.replace(code, "");
        }
        cleaned
    }
}

impl OutputSink for HostOutput {
    fn write(&self, message: &str, level: LogLevel) {
        if level > self.max_level || message.is_empty() || !self.is_enabled() {
            return;
        }

        let cleaned = Self::strip_raw_colors(message);
        let lines: Vec<&str> = cleaned.split('\n').collect();
        let last = lines.len() - 1;

        let mut state = self.state.lock().unwrap();
        for (index, line) in lines.iter().enumerate() {
            if state.line_start {
                let prefix = self.formatter.line_prefix(level);
                let _ = state.writer.write_all(prefix.as_bytes());
                state.line_start = false;
            }
            let formatted = self.formatter.format_message(line, level);
            let _ = state.writer.write_all(formatted.as_bytes());
            if lines.len() > 1 && index < last {
                let _ = state.writer.write_all(b"\n");
                state.line_start = true;
            }
        }
        let _ = state.writer.flush();
    }

    fn write_line(&self, message: &str, level: LogLevel) {
        if level > self.max_level {
            return;
        }
        self.write(message, level);
        self.blank_line();
    }

    fn blank_line(&self) {
        if !self.is_enabled() {
            return;
        }
        let mut state = self.state.lock().unwrap();
        let _ = state.writer.write_all(b"\n");
        let _ = state.writer.flush();
        state.line_start = true;
    }
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(max_level: LogLevel) -> (HostOutput, Arc<Mutex<Vec<u8>>>) {
        HostOutput::buffered(max_level, HostFormatter::new("", 0, true))
    }

    fn captured(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn test_writes_lines_to_writer() {
        let (host, buffer) = plain(LogLevel::Debug);
        host.write_line("hello", LogLevel::Message);
        assert_eq!(captured(&buffer), "hello\n");
    }

    #[test]
    fn test_drops_messages_above_max_level() {
        let (host, buffer) = plain(LogLevel::Info);
        host.write_line("visible", LogLevel::Info);
        host.write_line("hidden", LogLevel::Debug);
        assert_eq!(captured(&buffer), "visible\n");
    }

    #[test]
    fn test_errors_always_pass_the_filter() {
        let (host, buffer) = plain(LogLevel::Error);
        host.write_line("boom", LogLevel::Error);
        host.write_line("chatter", LogLevel::Message);
        assert_eq!(captured(&buffer), "boom\n");
    }

    #[test]
    fn test_multiline_message_prefixes_every_line() {
        let (host, buffer) = HostOutput::buffered(
            LogLevel::Debug,
            HostFormatter::new("term", 0, true),
        );
        host.write_line("a\nb", LogLevel::Message);
        assert_eq!(captured(&buffer), "term:a\nterm:b\n");
    }

    #[test]
    fn test_strips_raw_color_codes() {
        let (host, buffer) = plain(LogLevel::Debug);
        host.write_line("\u{1b}[32mgreen\u{1b}[0m", LogLevel::Message);
        assert_eq!(captured(&buffer), "green\n");
    }

    #[test]
    fn test_disabled_host_is_silent() {
        let (host, buffer) = plain(LogLevel::Debug);
        host.set_enabled(false);
        host.write_line("ignored", LogLevel::Message);
        assert_eq!(captured(&buffer), "");
    }

    #[test]
    fn test_indentation_follows_level() {
        let (host, buffer) = HostOutput::buffered(
            LogLevel::Debug,
            HostFormatter::new("", 2, true),
        );
        host.write_line("deep", LogLevel::Debug);
        assert_eq!(captured(&buffer), "        deep\n");
    }
}
