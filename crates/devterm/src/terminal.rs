use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use devterm_output::{CommandLogger, LogLevel};
use tokio::task::JoinHandle;

use crate::command::{CommandResult, TerminalCommand};
use crate::monitor::TerminalMonitor;
use crate::process::ShellProcess;
use crate::syntax::ShellSyntax;
use crate::{Result, TerminalError, MAX_EXECUTE_TIMEOUT_MS};

/// One physical write-then-wait cycle against the shell.
///
/// The id is unique for the lifetime of the session, which makes the
/// sentinel line `@@<id>@<exit code>` impossible to confuse with any
/// earlier command's sentinel still draining from the stream.
struct RunUnit {
    id: u32,
    command: String,
}

impl RunUnit {
    fn sentinel_prefix(&self) -> String {
        format!("@@{}@", self.id)
    }
}

/// Binary semaphore serializing run units, with an acquisition ceiling
/// so a wedged prior execution cannot hang callers forever.
struct ExecGate {
    locked: Mutex<bool>,
    unlocked: Condvar,
}

impl ExecGate {
    fn new() -> Self {
        Self {
            locked: Mutex::new(false),
            unlocked: Condvar::new(),
        }
    }

    fn acquire(&self, timeout: Duration) -> Result<GateGuard<'_>> {
        let locked = self.locked.lock().unwrap();
        let (mut locked, wait) = self
            .unlocked
            .wait_timeout_while(locked, timeout, |locked| *locked)
            .unwrap();
        if wait.timed_out() {
            return Err(TerminalError::GateTimeout);
        }
        *locked = true;
        Ok(GateGuard { gate: self })
    }

    fn release(&self) {
        *self.locked.lock().unwrap() = false;
        self.unlocked.notify_one();
    }
}

/// Releases the gate on every exit path, including errors.
struct GateGuard<'a> {
    gate: &'a ExecGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// A long-lived shell session executing submitted commands one at a
/// time.
///
/// The execution gate guarantees at most one run unit is in flight, so
/// no two commands can interleave their writes to the shared input
/// stream or their reads from the shared output channel.
pub struct Terminal {
    process: ShellProcess,
    monitor: TerminalMonitor,
    logger: Arc<CommandLogger>,
    syntax: Box<dyn ShellSyntax>,
    gate: ExecGate,
    console_log_level: LogLevel,
    next_run_id: AtomicU32,
}

impl Terminal {
    pub fn new(
        syntax: Box<dyn ShellSyntax>,
        monitor: TerminalMonitor,
        logger: Arc<CommandLogger>,
        process: ShellProcess,
    ) -> Self {
        monitor.attach(&logger);
        let console_log_level = logger.log_level();
        Self {
            process,
            monitor,
            logger,
            syntax,
            gate: ExecGate::new(),
            console_log_level,
            next_run_id: AtomicU32::new(0),
        }
    }

    pub fn syntax(&self) -> &dyn ShellSyntax {
        self.syntax.as_ref()
    }

    pub fn monitor(&self) -> &TerminalMonitor {
        &self.monitor
    }

    pub fn log_level(&self) -> LogLevel {
        self.logger.log_level()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.logger.set_log_level(level);
    }

    pub fn set_host_output_enabled(&self, enabled: bool) {
        self.monitor.host().set_enabled(enabled);
    }

    pub fn has_exited(&self) -> bool {
        self.process.has_exited()
    }

    /// Working directory the shell is currently in.
    pub fn current_dir(&self) -> Result<String> {
        let probe = format!("echo {}", self.syntax.current_dir_probe());
        let result = self.execute(TerminalCommand::parse(&probe).with_log_level(LogLevel::Debug))?;
        Ok(result.output.trim().to_string())
    }

    /// Parse and execute a single command line.
    pub fn shell(&self, command: &str) -> Result<CommandResult> {
        self.execute(TerminalCommand::parse(command))
    }

    /// Execute a command line after changing into `working_dir`.
    pub fn shell_in(&self, command: &str, working_dir: &str) -> Result<CommandResult> {
        self.execute(TerminalCommand::cd(working_dir).and(TerminalCommand::parse(command)))
    }

    /// Execute a command or chain, blocking until it completes.
    ///
    /// Chain links run sequentially; output is aggregated with a line
    /// break between links, and the first non-zero exit code
    /// short-circuits the rest. The returned exit code is the last
    /// executed link's.
    pub fn execute(&self, command: TerminalCommand) -> Result<CommandResult> {
        let _gate = self
            .gate
            .acquire(Duration::from_millis(MAX_EXECUTE_TIMEOUT_MS))?;

        let mut current = command;
        let mut queue = current.take_pipe();
        if queue.is_empty() {
            return self.execute_command(current);
        }

        let mut result = self.execute_command(current)?;
        let mut aggregate = result.output.clone();
        while result.exit_code == 0 {
            let Some(mut next) = queue.pop_front() else {
                break;
            };
            // Queued links are flattened on append, but a link built
            // elsewhere may still carry successors of its own.
            let mut nested = next.take_pipe();
            while let Some(link) = nested.pop_back() {
                queue.push_front(link);
            }

            result = self.execute_command(next)?;
            aggregate.push('\n');
            aggregate.push_str(&result.output);
        }

        Ok(CommandResult::new(aggregate, result.exit_code))
    }

    /// Run `execute` on a blocking worker thread. Same protocol, same
    /// serialization; only the calling thread differs.
    pub fn execute_async(
        self: Arc<Self>,
        command: TerminalCommand,
    ) -> JoinHandle<Result<CommandResult>> {
        tokio::task::spawn_blocking(move || self.execute(command))
    }

    /// Kill the underlying shell. The session cannot be used afterwards.
    pub fn close(&self) {
        self.process.kill();
    }

    fn execute_command(&self, mut command: TerminalCommand) -> Result<CommandResult> {
        let raw = if command.raw_input() {
            command.arguments().join(" ")
        } else {
            self.syntax.build_command_line(command.arguments())
        };
        if raw.trim().is_empty() {
            return Err(TerminalError::InvalidArgument("command text is empty"));
        }

        if let Some(level) = command.log_level() {
            self.logger.set_log_level(level);
        }

        let run = RunUnit {
            id: self.next_run_id.fetch_add(1, Ordering::SeqCst),
            command: raw,
        };
        let result = self.execute_run_unit(&run);

        self.logger.set_log_level(self.console_log_level);

        let result = result?;
        if let Some(on_complete) = command.take_on_complete() {
            on_complete(&result);
        }
        Ok(result)
    }

    fn execute_run_unit(&self, run: &RunUnit) -> Result<CommandResult> {
        self.monitor.write_host_line(&run.command, LogLevel::Debug);

        let prefix = run.sentinel_prefix();
        let status_probe = format!("echo {}{}", prefix, self.syntax.exit_code_probe());

        self.process.write_line(&run.command)?;
        self.process.write_line(&status_probe)?;

        let skip = self
            .syntax
            .skip_wildcards(&[run.command.as_str(), status_probe.as_str()]);
        let sentinel = self
            .monitor
            .wait_for_result(&format!("{prefix}*"), &skip)?;
        let exit_code = parse_exit_status(&sentinel, &prefix)?;

        let output = self.monitor.output();
        self.monitor
            .write_host_line(&format!("Exit code {exit_code}"), LogLevel::Debug);
        self.monitor.reset();

        Ok(CommandResult::new(output, exit_code))
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.process.kill();
    }
}

/// Extract the numeric exit status following the sentinel prefix. An
/// unparseable payload means the shell produced a sentinel line the
/// protocol cannot trust.
fn parse_exit_status(sentinel: &str, prefix: &str) -> Result<i32> {
    let payload = &sentinel[prefix.len()..];
    payload.trim().parse().map_err(|_| {
        TerminalError::Protocol(format!(
            "sentinel carried an unparseable exit status: {payload:?}"
        ))
    })
}
