use thiserror::Error;

/// Errors surfaced by the terminal protocol.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// A required argument was missing or empty; rejected before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The shell produced output the completion protocol cannot
    /// interpret. The session is no longer trustworthy and should be
    /// recreated rather than reused.
    #[error("terminal protocol violation: {0}")]
    Protocol(String),

    /// A command finished with an exit code other than the declared
    /// expectation.
    #[error("process exit code '{actual}' is not the expected '{expected}'")]
    UnexpectedExitCode { actual: i32, expected: i32 },

    /// The execution gate could not be acquired within the defensive
    /// ceiling; a prior execution never completed.
    #[error("timed out waiting for the terminal execution gate")]
    GateTimeout,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
