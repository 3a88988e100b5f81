use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command as StdCommand, ExitStatus, Output, Stdio};

/// Builder over [`std::process::Command`] that maps spawn failures and
/// non-zero exits onto [`Error`].
#[derive(Debug)]
pub struct Command {
    inner: StdCommand,
    program: String,
}

impl Command {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        let program = program.as_ref();
        Self {
            inner: StdCommand::new(program),
            program: program.to_string_lossy().into_owned(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.inner.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.inner.current_dir(dir);
        self
    }

    /// Program followed by its arguments, for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(
                self.inner
                    .get_args()
                    .map(|a| a.to_string_lossy().into_owned()),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion with captured output, whatever the exit status.
    pub fn capture(mut self) -> Result<Output> {
        self.inner.stdin(Stdio::null());
        self.inner.output().map_err(|e| Error::CommandFailed {
            cmd: self.program.clone(),
            source: e,
        })
    }

    /// Run to completion; a non-zero exit becomes [`Error::NonZeroExit`].
    pub fn run(self) -> Result<Output> {
        let cmd = self.command_line();
        tracing::debug!(%cmd, "running");
        let output = self.capture()?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(Error::NonZeroExit {
                cmd,
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }

    /// Run with inherited stdio and hand back the raw exit status.
    pub fn status(mut self) -> Result<ExitStatus> {
        self.inner.status().map_err(|e| Error::CommandFailed {
            cmd: self.program.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_new() {
        let cmd = Command::new("7zz");
        assert_eq!(cmd.program, "7zz");
    }

    #[test]
    fn test_command_args() {
        let cmd = Command::new("7zz").arg("l").arg("-slt");
        let args: Vec<_> = cmd.inner.get_args().collect();
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_command_args_iter() {
        let cmd = Command::new("7zz").args(["x", "a.7z", "-y"]);
        let args: Vec<_> = cmd.inner.get_args().collect();
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_command_line_joins_program_and_args() {
        let cmd = Command::new("7zz").args(["t", "archive.7z"]);
        assert_eq!(cmd.command_line(), "7zz t archive.7z");
    }

    #[test]
    fn test_command_current_dir() {
        let cmd = Command::new("7zz").current_dir("/tmp");
        assert_eq!(cmd.inner.get_current_dir(), Some(Path::new("/tmp")));
    }

    #[test]
    fn test_missing_program_is_command_failed() {
        let result = Command::new("nonexistent_binary_12345").run();
        assert!(matches!(result, Err(Error::CommandFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_mapped() {
        let result = Command::new("sh")
            .args(["-c", "echo 'ERROR: broken' >&2; exit 2"])
            .run();
        match result {
            Err(Error::NonZeroExit { code, stderr, .. }) => {
                assert_eq!(code, Some(2));
                assert!(stderr.contains("ERROR: broken"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_returns_output() {
        let output = Command::new("sh").args(["-c", "printf ok"]).run().unwrap();
        assert_eq!(output.stdout, b"ok");
    }
}
