//! Execution Timeout Management
//!
//! Bounds how long a single tailscale invocation may run.

use super::executor::ExecutionError;
use std::future::Future;
use std::time::Duration;
use tokio::time;

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Execution timeout configuration
///
/// Timeouts are enforced to prevent commands from hanging indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionTimeout {
    duration: Duration,
}

impl Default for ExecutionTimeout {
    fn default() -> Self {
        Self::from_secs(DEFAULT_TIMEOUT_SECS)
    }
}

impl ExecutionTimeout {
    /// Create a new execution timeout
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use tailscale_mcp::tools::ExecutionTimeout;
    ///
    /// let timeout = ExecutionTimeout::new(Duration::from_secs(30));
    /// assert_eq!(timeout.duration(), Duration::from_secs(30));
    /// ```
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Create a timeout for quick operations like `version` (10 seconds)
    pub fn short() -> Self {
        Self::from_secs(10)
    }

    /// Create a timeout for slow operations like `netcheck` (2 minutes)
    pub fn long() -> Self {
        Self::from_secs(120)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Execute a future with this timeout
    ///
    /// The future is dropped when the timeout expires. Anything it owns,
    /// such as a child process spawned with `kill_on_drop`, is torn down
    /// with it.
    pub async fn run<F, T>(&self, future: F) -> Result<T, ExecutionError>
    where
        F: Future<Output = Result<T, ExecutionError>>,
    {
        match time::timeout(self.duration, future).await {
            Ok(result) => result,
            Err(_) => Err(ExecutionError::Timeout {
                after: self.duration,
            }),
        }
    }
}

impl From<Duration> for ExecutionTimeout {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}
