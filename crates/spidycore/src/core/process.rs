//! Process execution utilities with timeout support
//!
//! Runs external tools (yt-dlp, ffmpeg) to completion and hands back the exit
//! status plus captured output. A non-zero exit is *not* an error here; the
//! caller inspects [`CommandOutput`]. Only a failure to launch the process (or
//! a timeout) is reported as [`AppError`].

use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::core::error::AppError;

/// A fully-formed external command line. Arguments are passed verbatim, no shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str().to_owned())
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// True if any argument equals `needle`
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    /// Value following `flag`, e.g. `value_of("-o")`
    pub fn value_of(&self, flag: &str) -> Option<String> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|v| v.to_string_lossy().into_owned())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit status with trimmed stdout/stderr
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; -1 when the process was terminated by a signal
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs external commands. The seam the orchestrator is tested through.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &ToolCommand) -> Result<CommandOutput, AppError>;
}

/// Runs commands with `tokio::process`
///
/// Children are killed when the future is dropped, so a cancelled request
/// does not leave yt-dlp or ffmpeg running.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<CommandOutput, AppError> {
        let mut command = Command::new(cmd.program());
        command
            .args(cmd.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match cmd.get_timeout() {
            Some(timeout) => run_with_timeout(&mut command, cmd.program(), timeout).await?,
            None => command.output().await?,
        };

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run an async Command with a timeout.
///
/// Returns the process Output on success, or an AppError on timeout/IO failure.
pub async fn run_with_timeout(
    cmd: &mut Command,
    program: &str,
    timeout: Duration,
) -> Result<std::process::Output, AppError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(AppError::Io(e)),
        Err(_) => Err(AppError::Timeout {
            program: program.to_string(),
            timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_command_display_and_lookup() {
        let cmd = ToolCommand::new("yt-dlp")
            .args(["--cookies", "/tmp/x/cookie.txt", "--dump-json"])
            .arg("https://example.com/v");
        assert_eq!(
            cmd.to_string(),
            "yt-dlp --cookies /tmp/x/cookie.txt --dump-json https://example.com/v"
        );
        assert!(cmd.has_arg("--dump-json"));
        assert_eq!(cmd.value_of("--cookies").as_deref(), Some("/tmp/x/cookie.txt"));
        assert_eq!(cmd.value_of("-o"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let cmd = ToolCommand::new("sh").args(["-c", "echo ' out '; echo ' err ' >&2; exit 3"]);
        let output = SystemRunner.run(&cmd).await.unwrap();
        assert_eq!(output.status, 3);
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_missing_binary_is_infrastructure_error() {
        let cmd = ToolCommand::new("definitely-not-a-real-binary-7f3a");
        let err = SystemRunner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let cmd = ToolCommand::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(100));
        let err = SystemRunner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout { .. }));
    }
}
