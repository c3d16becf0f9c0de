//! Process Executor
//!
//! Runs the tailscale binary with an argument vector, under a timeout and an
//! optional cancellation signal. The program is spawned directly, never
//! through a shell, and is killed if the call is abandoned.

use super::command::ArgumentVector;
use super::error::ErrorKind;
use super::timeout::ExecutionTimeout;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Maximum captured size per stream in bytes (1MB)
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Future that resolves when the caller wants the call abandoned
pub type CancelSignal = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A cancellation signal that never fires
pub fn never_cancel() -> CancelSignal {
    Box::pin(std::future::pending())
}

/// Result of a process that ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the process exited with status zero
    pub exited_zero: bool,

    /// Exit code (None if terminated by a signal)
    pub exit_code: Option<i32>,

    /// Standard output, trimmed
    pub stdout: String,

    /// Standard error, trimmed
    pub stderr: String,
}

impl ExecutionOutcome {
    /// Human-readable summary for logs
    pub fn summary(&self) -> String {
        if self.exited_zero {
            format!("Success ({} bytes output)", self.stdout.len())
        } else {
            format!(
                "Failed (exit code: {:?}, {} bytes output)",
                self.exit_code,
                self.stdout.len() + self.stderr.len()
            )
        }
    }
}

/// Process-level failures
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Failed to execute {program}: {source}")]
    SpawnFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("Command was cancelled")]
    Cancelled,
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::SpawnFailure { .. } => ErrorKind::SpawnFailure,
            ExecutionError::Timeout { .. } => ErrorKind::Timeout,
            ExecutionError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// The seam between the tool core and the operating system
///
/// `TokioProcessRunner` is the real implementation; tests substitute
/// recording runners to observe what would have been executed.
#[async_trait]
pub trait ProcessRunner: Send + Sync + fmt::Debug {
    async fn run(
        &self,
        program: &Path,
        args: &ArgumentVector,
        timeout: ExecutionTimeout,
        cancel: CancelSignal,
    ) -> Result<ExecutionOutcome, ExecutionError>;
}

/// Runs processes with `tokio::process`
///
/// # Security
///
/// 1. Arguments are passed as a vector, never through a shell
/// 2. stdin is closed so the program can not block on input
/// 3. The child is killed when its wait is dropped (timeout or cancel)
/// 4. At most `max_output_size + 1` bytes per stream are kept in memory;
///    the rest is read and discarded so the child never blocks on a full pipe
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    max_output_size: usize,
    limiter: Option<Arc<Semaphore>>,
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self {
            max_output_size: MAX_OUTPUT_SIZE,
            limiter: None,
        }
    }

    /// Bound captured output per stream
    pub fn with_max_output_size(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }

    /// Allow at most `limit` processes at once across clones of this runner
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    pub fn max_output_size(&self) -> usize {
        self.max_output_size
    }

    async fn spawn_and_wait(
        &self,
        program: &Path,
        args: &ArgumentVector,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        // Held until the process finishes or this future is dropped
        let _permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| ExecutionError::Cancelled)?,
            ),
            None => None,
        };

        let mut process = TokioCommand::new(program);
        process
            .args(args.as_slice())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = process
            .spawn()
            .map_err(|source| ExecutionError::SpawnFailure {
                program: program.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (status, stdout, stderr) = tokio::try_join!(
            child.wait(),
            read_bounded(stdout, self.max_output_size),
            read_bounded(stderr, self.max_output_size),
        )
        .map_err(|source| ExecutionError::SpawnFailure {
            program: program.display().to_string(),
            source,
        })?;

        Ok(ExecutionOutcome {
            exited_zero: status.success(),
            exit_code: status.code(),
            stdout: capture(&stdout, self.max_output_size),
            stderr: capture(&stderr, self.max_output_size),
        })
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &ArgumentVector,
        timeout: ExecutionTimeout,
        cancel: CancelSignal,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let start = Instant::now();
        debug!(program = %program.display(), args = %args, "Executing command");

        let result = tokio::select! {
            result = timeout.run(self.spawn_and_wait(program, args)) => result,
            _ = cancel => Err(ExecutionError::Cancelled),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(outcome) => {
                if !outcome.stderr.is_empty() {
                    warn!(
                        program = %program.display(),
                        stderr = %outcome.stderr,
                        "Command wrote to stderr"
                    );
                }
                debug!(elapsed_ms, "{}", outcome.summary());
            }
            Err(e @ ExecutionError::SpawnFailure { .. }) => {
                error!(program = %program.display(), error = %e, "Command could not be started");
            }
            Err(e) => {
                warn!(program = %program.display(), elapsed_ms, error = %e, "Command terminated");
            }
        }

        result
    }
}

/// Run `program` once with the default runner and no cancellation
pub async fn execute(
    program: &Path,
    args: &ArgumentVector,
    timeout: ExecutionTimeout,
) -> Result<ExecutionOutcome, ExecutionError> {
    TokioProcessRunner::new()
        .run(program, args, timeout, never_cancel())
        .await
}

/// Keep the first `limit + 1` bytes of a stream and drain the remainder
async fn read_bounded<R>(reader: Option<R>, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(buf);
    };
    // One byte past the limit marks the stream as truncated
    let keep = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    (&mut reader).take(keep).read_to_end(&mut buf).await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(buf)
}

/// Decode, bound and trim one captured stream
fn capture(bytes: &[u8], max_len: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    truncate_string(text.trim().to_string(), max_len)
}

/// Truncate a string to a maximum byte length, adding ellipsis if truncated
fn truncate_string(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len.saturating_sub(3);
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}
