use std::ffi::OsStr;
use std::io;
use std::process::Stdio;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::process::Command;

pub const DEFAULT_SHELL: &str = "sh";

/// What a finished command left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one expanded process command.
///
/// Dropping the returned future must stop the command; the dispatcher relies on
/// that to abandon in-flight work after a failure.
pub trait CommandExecutor: Send + Sync {
    fn execute<'a>(&'a self, command: &'a OsStr) -> BoxFuture<'a, io::Result<CommandOutput>>;
}

impl<T> CommandExecutor for Arc<T>
where
    T: CommandExecutor + ?Sized,
{
    fn execute<'a>(&'a self, command: &'a OsStr) -> BoxFuture<'a, io::Result<CommandOutput>> {
        (**self).execute(command)
    }
}

/// Runs commands as `<shell> -c <command>`, discarding stdout and capturing stderr.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute<'a>(&'a self, command: &'a OsStr) -> BoxFuture<'a, io::Result<CommandOutput>> {
        Box::pin(async move {
            let output = Command::new(&self.shell)
                .arg("-c")
                .arg(command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await?;

            Ok(CommandOutput {
                code: output.status.code(),
                stderr: output.stderr,
            })
        })
    }
}
