use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use devterm_output::LogLevel;

use crate::{Result, TerminalError};

/// The captured outcome of one executed command or chain. Immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub output: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn new(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Fail with `UnexpectedExitCode` unless the exit code matches.
    pub fn ensure_exit_code(&self, expected: i32) -> Result<&Self> {
        if self.exit_code != expected {
            return Err(TerminalError::UnexpectedExitCode {
                actual: self.exit_code,
                expected,
            });
        }
        Ok(self)
    }
}

/// Callback invoked with a link's result once it finishes.
pub type OnComplete = Box<dyn FnOnce(&CommandResult) + Send + 'static>;

/// One logical command, optionally chained to successors that only run
/// while every predecessor exits with status zero.
///
/// The chain is an owned FIFO queue held by the first link; appending
/// moves the appended command (and its own queue, flattened) to the tail,
/// so a link can never belong to two chains and a partially consumed
/// chain has no stale links to revisit.
pub struct TerminalCommand {
    arguments: Vec<String>,
    log_level: Option<LogLevel>,
    on_complete: Option<OnComplete>,
    raw_input: bool,
    pipe: VecDeque<TerminalCommand>,
}

impl TerminalCommand {
    pub fn new<I, S>(arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            arguments: arguments.into_iter().map(Into::into).collect(),
            log_level: None,
            on_complete: None,
            raw_input: false,
            pipe: VecDeque::new(),
        }
    }

    /// Split a command line on whitespace into arguments.
    pub fn parse(command: &str) -> Self {
        Self::new(command.split_whitespace())
    }

    /// A change-directory command, logged at debug level.
    pub fn cd(working_dir: &str) -> Self {
        Self::new(["cd", working_dir]).with_log_level(LogLevel::Debug)
    }

    /// A command passed to the shell verbatim, bypassing the dialect's
    /// command-line builder.
    pub fn raw(command: &str) -> Self {
        let mut terminal_command = Self::new([command]);
        terminal_command.raw_input = true;
        terminal_command
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn with_on_complete(mut self, on_complete: OnComplete) -> Self {
        self.on_complete = Some(on_complete);
        self
    }

    /// Append `next` to the chain. `next`'s own queue is flattened onto
    /// the tail, so every queued link carries an empty queue of its own.
    pub fn and(mut self, mut next: TerminalCommand) -> Self {
        let tail = std::mem::take(&mut next.pipe);
        self.pipe.push_back(next);
        self.pipe.extend(tail);
        self
    }

    /// Alias for [`and`](Self::and), matching pipe terminology.
    pub fn pipe(self, next: TerminalCommand) -> Self {
        self.and(next)
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    pub fn raw_input(&self) -> bool {
        self.raw_input
    }

    pub fn has_next(&self) -> bool {
        !self.pipe.is_empty()
    }

    /// Detach the queued successors, leaving this link single.
    pub(crate) fn take_pipe(&mut self) -> VecDeque<TerminalCommand> {
        std::mem::take(&mut self.pipe)
    }

    pub(crate) fn take_on_complete(&mut self) -> Option<OnComplete> {
        self.on_complete.take()
    }
}

impl fmt::Debug for TerminalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalCommand")
            .field("arguments", &self.arguments)
            .field("log_level", &self.log_level)
            .field("raw_input", &self.raw_input)
            .field("queued", &self.pipe.len())
            .finish()
    }
}
