use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use devterm_output::{CommandLogger, HostFormatter, HostOutput, LogLevel, TextOutput};

use crate::monitor::TerminalMonitor;
use crate::process::ShellProcess;
use crate::syntax::{default_syntax, ShellSyntax};
use crate::terminal::Terminal;
use crate::Result;

/// Options for building a terminal session.
#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    /// Directory the shell starts in; inherited from the caller if unset.
    pub working_directory: Option<PathBuf>,
    /// Console log level; defaults to `Info`.
    pub log_level: Option<LogLevel>,
    /// Label prepended to every host console line.
    pub prefix: String,
    /// Disable console coloring.
    pub no_color: bool,
    /// Extra environment variables for the shell process.
    pub env: HashMap<String, String>,
}

/// Create a terminal for the host operating system's default shell.
pub fn create_default_terminal(options: ShellOptions) -> Result<Terminal> {
    create_terminal(default_syntax(), options)
}

/// Wire logger, monitor and shell process into a terminal the standard
/// way: the logger fans process output into the monitor's channel, the
/// monitor forwards accepted lines to the capture and console sinks.
pub fn create_terminal(syntax: Box<dyn ShellSyntax>, options: ShellOptions) -> Result<Terminal> {
    let log_level = options.log_level.unwrap_or(LogLevel::Info);
    let logger = Arc::new(CommandLogger::new(log_level));
    let host = HostOutput::stdout(
        log_level,
        HostFormatter::new(&options.prefix, 1, options.no_color),
    );
    let monitor = TerminalMonitor::new(Arc::new(TextOutput::new()), Arc::new(host));
    let process = ShellProcess::spawn(
        syntax.command_name(),
        options.working_directory.as_deref(),
        &options.env,
        Arc::clone(&logger),
    )?;

    Ok(Terminal::new(syntax, monitor, logger, process))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ShellOptions::default();
        assert!(options.working_directory.is_none());
        assert!(options.log_level.is_none());
        assert!(options.env.is_empty());
        assert!(!options.no_color);
    }

    #[cfg(unix)]
    #[test]
    fn test_create_default_terminal_spawns_a_shell() {
        let terminal = create_default_terminal(ShellOptions::default()).unwrap();
        assert!(!terminal.has_exited());
        assert_eq!(terminal.log_level(), LogLevel::Info);
        terminal.close();
    }
}
