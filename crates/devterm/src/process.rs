use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use devterm_output::CommandLogger;

use crate::{Result, TerminalError};

/// The persistent shell child process with redirected stdio.
///
/// Output and error streams are pumped by dedicated reader threads that
/// forward complete lines to the shared `CommandLogger`; the threads
/// exit on EOF when the shell dies. The process is killed on drop.
pub struct ShellProcess {
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    // Dropped without joining: a blocked read ends when the process dies.
    _reader_threads: Vec<JoinHandle<()>>,
}

impl ShellProcess {
    /// Spawn the shell and start the stream reader threads.
    pub fn spawn(
        program: &str,
        working_dir: Option<&Path>,
        env: &HashMap<String, String>,
        logger: Arc<CommandLogger>,
    ) -> Result<Self> {
        let mut command = Command::new(program);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }
        for (name, value) in env {
            command.env(name, value);
        }

        let mut child = command.spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TerminalError::Protocol("shell stdin was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TerminalError::Protocol("shell stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TerminalError::Protocol("shell stderr was not captured".to_string()))?;

        let mut reader_threads = Vec::with_capacity(2);

        let output_logger = Arc::clone(&logger);
        reader_threads.push(thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                match line {
                    Ok(line) => output_logger.log_output(&line),
                    Err(_) => break,
                }
            }
        }));

        reader_threads.push(thread::spawn(move || {
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) => logger.log_error(&line),
                    Err(_) => break,
                }
            }
        }));

        Ok(Self {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            _reader_threads: reader_threads,
        })
    }

    /// Write one line to the shell's input stream and flush it.
    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut stdin = self.stdin.lock().unwrap();
        stdin.write_all(line.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;
        Ok(())
    }

    pub fn has_exited(&self) -> bool {
        self.child
            .lock()
            .unwrap()
            .try_wait()
            .map(|status| status.is_some())
            .unwrap_or(true)
    }

    /// Exit code if the shell has already terminated.
    pub fn exit_code(&self) -> Option<i32> {
        self.child
            .lock()
            .unwrap()
            .try_wait()
            .ok()
            .flatten()
            .and_then(|status| status.code())
    }

    /// Kill the shell and reap it. Reader threads exit on the resulting
    /// EOF.
    pub fn kill(&self) {
        let mut child = self.child.lock().unwrap();
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Drop for ShellProcess {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use devterm_output::{LogLevel, TextOutput};
    use std::time::Duration;

    fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("condition not reached in time");
    }

    #[test]
    fn test_reader_threads_forward_lines() {
        let logger = Arc::new(CommandLogger::new(LogLevel::Message));
        let sink = Arc::new(TextOutput::new());
        logger.add(sink.clone());

        let process =
            ShellProcess::spawn("/bin/sh", None, &HashMap::new(), Arc::clone(&logger)).unwrap();
        process.write_line("echo from the shell").unwrap();

        wait_for(|| sink.output().contains("from the shell"));
        process.kill();
    }

    #[test]
    fn test_stderr_lines_are_tagged_error() {
        let logger = Arc::new(CommandLogger::new(LogLevel::Message));
        let sink = Arc::new(TextOutput::new());
        logger.add(sink.clone());

        let process =
            ShellProcess::spawn("/bin/sh", None, &HashMap::new(), Arc::clone(&logger)).unwrap();
        process.write_line("echo oops 1>&2").unwrap();

        wait_for(|| sink.error().contains("oops"));
        process.kill();
    }

    #[test]
    fn test_kill_reaps_the_shell() {
        let logger = Arc::new(CommandLogger::new(LogLevel::Message));
        let process = ShellProcess::spawn("/bin/sh", None, &HashMap::new(), logger).unwrap();
        assert!(!process.has_exited());
        process.kill();
        assert!(process.has_exited());
    }

    #[test]
    fn test_spawn_failure_surfaces_io_error() {
        let logger = Arc::new(CommandLogger::new(LogLevel::Message));
        let result = ShellProcess::spawn(
            "/definitely/not/a/shell",
            None,
            &HashMap::new(),
            logger,
        );
        assert!(matches!(result, Err(TerminalError::Io(_))));
    }
}
