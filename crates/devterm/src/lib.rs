// devterm - persistent shell terminal driver
//
// Drives a single long-lived shell process as a reusable execution
// engine: callers submit commands (singly or chained) and receive
// captured output plus exit status without spawning a process per
// command. Completion is detected by echoing a per-execution sentinel
// line (`@@<id>@<exit code>`) through the shell's own output stream.

mod command;
mod error;
mod monitor;
mod process;
mod shells;
mod syntax;
mod terminal;
mod wildcard;

// Re-export public API
pub use command::{CommandResult, OnComplete, TerminalCommand};
pub use error::TerminalError;
pub use monitor::TerminalMonitor;
pub use process::ShellProcess;
pub use shells::{create_default_terminal, create_terminal, ShellOptions};
pub use syntax::{default_syntax, PosixShSyntax, ShellSyntax, WindowsCmdSyntax};
pub use terminal::Terminal;
pub use wildcard::match_wildcard;

pub use devterm_output::{
    ChannelOutput, CommandLogger, HostFormatter, HostOutput, LogLevel, OutputMessage, OutputSink,
    TextOutput,
};

/// Ceiling on waiting for the execution gate. A defensive bound against a
/// wedged prior execution, not a normal-path timeout.
pub const MAX_EXECUTE_TIMEOUT_MS: u64 = 3_600_000; // 1h

pub type Result<T> = std::result::Result<T, TerminalError>;
