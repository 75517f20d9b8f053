/// A shell dialect: everything the terminal needs to know to drive one
/// kind of shell. Selected once at session creation and immutable
/// thereafter.
pub trait ShellSyntax: Send + Sync {
    /// Executable hosting the session.
    fn command_name(&self) -> &str;

    /// Join an argument list into one command line.
    fn build_command_line(&self, arguments: &[String]) -> String {
        arguments.join(" ")
    }

    /// Expansion printing the exit status of the previous command.
    fn exit_code_probe(&self) -> &str;

    /// Expansion printing the current working directory.
    fn current_dir_probe(&self) -> &str;

    /// Patterns matching the shell's own echo of the given input lines.
    /// Matching lines are discarded during completion detection so input
    /// echo never pollutes captured output.
    fn skip_wildcards(&self, commands: &[&str]) -> Vec<String>;
}

/// POSIX `/bin/sh` dialect.
pub struct PosixShSyntax;

impl ShellSyntax for PosixShSyntax {
    fn command_name(&self) -> &str {
        "/bin/sh"
    }

    fn exit_code_probe(&self) -> &str {
        "$?"
    }

    fn current_dir_probe(&self) -> &str {
        "$PWD"
    }

    fn skip_wildcards(&self, commands: &[&str]) -> Vec<String> {
        // sh does not echo piped stdin, but a shell started with -v or -i
        // re-prints input verbatim, so match the exact input text.
        commands.iter().map(|command| (*command).to_string()).collect()
    }
}

/// Windows `cmd.exe` dialect.
pub struct WindowsCmdSyntax;

impl ShellSyntax for WindowsCmdSyntax {
    fn command_name(&self) -> &str {
        "cmd.exe"
    }

    fn exit_code_probe(&self) -> &str {
        "%errorlevel%"
    }

    fn current_dir_probe(&self) -> &str {
        "%cd%"
    }

    fn skip_wildcards(&self, commands: &[&str]) -> Vec<String> {
        // cmd echoes `C:\path>command`, so match on the trailing input text.
        commands.iter().map(|command| format!("*{command}")).collect()
    }
}

/// Dialect for the host operating system.
pub fn default_syntax() -> Box<dyn ShellSyntax> {
    if cfg!(windows) {
        Box::new(WindowsCmdSyntax)
    } else {
        Box::new(PosixShSyntax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_wildcard;

    #[test]
    fn test_posix_syntax() {
        let syntax = PosixShSyntax;
        assert_eq!(syntax.command_name(), "/bin/sh");
        assert_eq!(syntax.exit_code_probe(), "$?");
        assert_eq!(syntax.current_dir_probe(), "$PWD");
    }

    #[test]
    fn test_windows_syntax() {
        let syntax = WindowsCmdSyntax;
        assert_eq!(syntax.command_name(), "cmd.exe");
        assert_eq!(syntax.exit_code_probe(), "%errorlevel%");
        assert_eq!(syntax.current_dir_probe(), "%cd%");
    }

    #[test]
    fn test_build_command_line_joins_with_spaces() {
        let syntax = PosixShSyntax;
        let args = vec!["echo".to_string(), "shell".to_string(), "test".to_string()];
        assert_eq!(syntax.build_command_line(&args), "echo shell test");
    }

    #[test]
    fn test_posix_skip_wildcards_match_echoed_input() {
        let syntax = PosixShSyntax;
        let cards = syntax.skip_wildcards(&["echo hi", "echo @@0@$?"]);
        assert!(cards.iter().any(|card| match_wildcard("echo hi", card)));
        assert!(!cards.iter().any(|card| match_wildcard("hi", card)));
    }

    #[test]
    fn test_windows_skip_wildcards_match_prompt_echo() {
        let syntax = WindowsCmdSyntax;
        let cards = syntax.skip_wildcards(&["echo hi"]);
        assert!(cards
            .iter()
            .any(|card| match_wildcard(r"C:\work>echo hi", card)));
    }

    #[test]
    fn test_default_syntax_picks_host_shell() {
        let syntax = default_syntax();
        if cfg!(windows) {
            assert_eq!(syntax.command_name(), "cmd.exe");
        } else {
            assert_eq!(syntax.command_name(), "/bin/sh");
        }
    }
}
