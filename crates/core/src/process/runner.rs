//! Command runner trait and the tokio-backed implementation.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use std::process::ExitStatus;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Split};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::error::ProcessError;

/// What to do with a process that outlives its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Kill the process and report a timeout error.
    #[default]
    Fail,
    /// Interrupt the process and return whatever it wrote.
    ///
    /// The process gets SIGINT so it can flush its output and run its own
    /// cleanup. It is killed only if it is still alive after
    /// [`INTERRUPT_GRACE`]. Used for tools that never exit on their own
    /// (e.g. `hcitool lescan`).
    KeepOutput,
}

/// How long an interrupted process may take to exit before it is killed.
pub const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

/// A single invocation of an external tool.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub on_timeout: TimeoutPolicy,
}

impl CommandRequest {
    /// Creates a request with a 10 second timeout.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: Duration::from_secs(10),
            on_timeout: TimeoutPolicy::Fail,
        }
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Keeps partial output instead of failing when the deadline passes.
    pub fn keep_output_on_timeout(mut self) -> Self {
        self.on_timeout = TimeoutPolicy::KeepOutput;
        self
    }

    /// Human-readable command line, used in logs.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a finished (or deadline-killed) process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Whether the process exited with status 0.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Whether the process was killed at its deadline.
    pub timed_out: bool,
}

impl CommandOutput {
    /// A successful exit with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// A failed exit with the given code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// Converts a non-zero exit into a [`ProcessError::Failed`].
    pub fn into_success(self, program: &str) -> Result<Self, ProcessError> {
        if self.success {
            Ok(self)
        } else {
            Err(ProcessError::Failed {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Seam for every external tool invocation.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Whether `program` resolves to an executable on PATH.
    async fn is_available(&self, program: &str) -> bool;

    /// Runs a command to completion (or to its deadline).
    async fn run(&self, request: CommandRequest) -> Result<CommandOutput, ProcessError>;
}

/// Runs real processes through `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    /// Overrides `$PATH` for availability probes.
    search_path: Option<OsString>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given PATH-style string instead of the process environment.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        let env_path = std::env::var_os("PATH");
        let path = self.search_path.as_deref().or(env_path.as_deref());
        find_on_path(program, path)
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn is_available(&self, program: &str) -> bool {
        self.resolve(program).is_some()
    }

    async fn run(&self, request: CommandRequest) -> Result<CommandOutput, ProcessError> {
        debug!("Running {}", request.command_line());

        let mut child = Command::new(&request.program)
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProcessError::NotFound {
                        program: request.program.clone(),
                    }
                } else {
                    ProcessError::spawn_failed(&request.program, e.to_string())
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessError::spawn_failed(&request.program, "stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProcessError::spawn_failed(&request.program, "stderr not captured"))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = BufReader::new(stderr).read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        // Lines are collected outside the timed future so a deadline keeps them.
        let mut lines: Vec<String> = Vec::new();
        let mut segments = BufReader::new(stdout).split(b'\n');
        let result = timeout(
            request.timeout,
            read_until_exit(&mut child, &mut segments, &mut lines),
        )
        .await;

        match result {
            Ok(Ok(status)) => {
                let stderr = stderr_task.await.unwrap_or_default();
                Ok(CommandOutput {
                    code: status.code(),
                    success: status.success(),
                    stdout: join_lines(lines),
                    stderr,
                    timed_out: false,
                })
            }
            Ok(Err(e)) => {
                stderr_task.abort();
                Err(ProcessError::Io(e))
            }
            Err(_) => match request.on_timeout {
                TimeoutPolicy::Fail => {
                    let _ = child.kill().await;
                    stderr_task.abort();
                    Err(ProcessError::Timeout {
                        program: request.program,
                        timeout_secs: request.timeout.as_secs(),
                    })
                }
                TimeoutPolicy::KeepOutput => {
                    let mut exited = false;
                    if interrupt(&child) {
                        let drained = timeout(
                            INTERRUPT_GRACE,
                            read_until_exit(&mut child, &mut segments, &mut lines),
                        )
                        .await;
                        exited = matches!(drained, Ok(Ok(_)));
                    }

                    let stderr = if exited {
                        match timeout(INTERRUPT_GRACE, stderr_task).await {
                            Ok(Ok(stderr)) => stderr,
                            _ => String::new(),
                        }
                    } else {
                        warn!(
                            "{} did not exit after interrupt, killing it",
                            request.program
                        );
                        let _ = child.kill().await;
                        stderr_task.abort();
                        String::new()
                    };

                    Ok(CommandOutput {
                        code: None,
                        success: false,
                        stdout: join_lines(lines),
                        stderr,
                        timed_out: true,
                    })
                }
            },
        }
    }
}

/// Collects stdout lines until EOF, then reaps the process.
async fn read_until_exit(
    child: &mut Child,
    segments: &mut Split<BufReader<ChildStdout>>,
    lines: &mut Vec<String>,
) -> std::io::Result<ExitStatus> {
    while let Some(segment) = segments.next_segment().await? {
        lines.push(String::from_utf8_lossy(&segment).into_owned());
    }
    child.wait().await
}

/// Sends SIGINT to a running child. Returns false if no signal was sent.
#[cfg(unix)]
fn interrupt(child: &Child) -> bool {
    let Some(pid) = child.id().and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return false;
    };
    // SAFETY: `kill` has no memory-safety preconditions. The pid belongs to a
    // child that has not been reaped yet, so it cannot have been reused.
    unsafe { libc::kill(pid, libc::SIGINT) == 0 }
}

#[cfg(not(unix))]
fn interrupt(_child: &Child) -> bool {
    false
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Resolves `program` against a PATH-style list of directories.
pub fn find_on_path(program: &str, path: Option<&OsStr>) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    if program.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }

    std::env::split_paths(path?)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
