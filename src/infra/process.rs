//! External process execution
//!
//! The orchestrator only talks to [`ProcessRunner`]; [`TokioProcessRunner`]
//! is the production implementation and tests substitute a scripted one.

use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// One child process to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to run, resolved through `PATH`
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory of the child
    pub working_dir: PathBuf,
    /// Send the child's stdout to our stderr (keeps our stdout clean for JSON)
    pub stdout_to_stderr: bool,
}

impl Invocation {
    /// Render as a single command line for logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process exited on its own
    Exited(i32),
    /// The process was killed after cancellation
    Killed(i32),
}

impl ProcessExit {
    /// Exit code to record
    pub fn code(self) -> i32 {
        match self {
            Self::Exited(code) | Self::Killed(code) => code,
        }
    }
}

/// Runs child processes to completion
pub trait ProcessRunner: Send + Sync {
    /// Start `invocation` and wait for it to terminate.
    ///
    /// An `Err` means the process could not be started (or waited on).
    /// When `cancel` fires while the child is running, the child is killed
    /// and [`ProcessExit::Killed`] is returned.
    fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> impl Future<Output = std::io::Result<ProcessExit>> + Send;
}

/// Process runner backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> impl Future<Output = std::io::Result<ProcessExit>> + Send {
        async move {
            let mut command = Command::new(&invocation.program);
            command
                .args(&invocation.args)
                .current_dir(&invocation.working_dir)
                .kill_on_drop(true);
            if invocation.stdout_to_stderr {
                command.stdout(Stdio::from(std::io::stderr()));
            }

            let mut child = command.spawn()?;
            tracing::debug!(pid = ?child.id(), "Spawned {}", invocation.command_line());

            tokio::select! {
                status = child.wait() => Ok(ProcessExit::Exited(exit_code(status?))),
                () = cancel.cancelled() => {
                    tracing::warn!(pid = ?child.id(), "Killing {}", invocation.program);
                    child.kill().await?;
                    let status = child.wait().await?;
                    Ok(ProcessExit::Killed(exit_code(status)))
                }
            }
        }
    }
}

/// Map an exit status to an integer code
///
/// Signal termination on Unix is reported shell-style as `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Locate a program on `PATH`
pub fn locate_program(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
