//! Tailscale CLI Client
//!
//! A caller-constructed client exposing each tailscale operation as one async
//! method. Every method runs a single pass of the tool pipeline and returns a
//! [`ResponseEnvelope`]; none of them return an error.
//!
//! # Usage
//!
//! ```no_run
//! use tailscale_mcp::tailscale::{TailscaleCli, TailscaleCliConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cli = TailscaleCli::new(&TailscaleCliConfig::default());
//!
//!     let envelope = cli.ping("my-server", Some(3.0)).await;
//!     if !envelope.is_success() {
//!         eprintln!("ping failed: {:?}", envelope.error());
//!     }
//! }
//! ```

pub mod status;

use crate::tools::{
    never_cancel, CancelSignal, ExecutionTimeout, OperationRequest, ProcessRunner, RawUpOptions,
    ResponseEnvelope, TokioProcessRunner, ValidationError, MAX_OUTPUT_SIZE,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub use status::{PeerStatus, StatusSummary, VersionInfo};

/// Default program name, resolved through `PATH`
pub const DEFAULT_BINARY: &str = "tailscale";

/// Settings fixed at client construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailscaleCliConfig {
    /// Path or bare name of the tailscale binary
    pub binary: PathBuf,

    /// Per-call timeout
    pub timeout: ExecutionTimeout,

    /// Maximum captured bytes per output stream
    pub max_output_size: usize,

    /// Maximum concurrently running tailscale processes (None: unbounded)
    pub max_concurrent: Option<usize>,
}

impl Default for TailscaleCliConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            timeout: ExecutionTimeout::default(),
            max_output_size: MAX_OUTPUT_SIZE,
            max_concurrent: None,
        }
    }
}

impl TailscaleCliConfig {
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = ExecutionTimeout::new(timeout);
        self
    }

    pub fn max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = Some(limit);
        self
    }
}

/// Client for the local tailscale binary
///
/// Holds no state besides its configuration, so clones can be used from
/// concurrent tasks freely. Each call owns its own child process.
#[derive(Debug, Clone)]
pub struct TailscaleCli {
    binary: Arc<Path>,
    timeout: ExecutionTimeout,
    runner: Arc<dyn ProcessRunner>,
}

impl TailscaleCli {
    /// Create a client that spawns real processes
    pub fn new(config: &TailscaleCliConfig) -> Self {
        let mut runner = TokioProcessRunner::new().with_max_output_size(config.max_output_size);
        if let Some(limit) = config.max_concurrent {
            runner = runner.with_max_concurrent(limit);
        }
        Self::with_runner(config, Arc::new(runner))
    }

    /// Create a client with a custom execution seam
    pub fn with_runner(config: &TailscaleCliConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            binary: Arc::from(config.binary.as_path()),
            timeout: config.timeout,
            runner,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> ExecutionTimeout {
        self.timeout
    }

    /// Run a validated request
    pub async fn run(&self, request: &OperationRequest) -> ResponseEnvelope<String> {
        self.run_with_cancel(request, never_cancel()).await
    }

    /// Run a validated request, killing the process if `cancel` resolves first
    pub async fn run_with_cancel(
        &self,
        request: &OperationRequest,
        cancel: CancelSignal,
    ) -> ResponseEnvelope<String> {
        let args = request.build();
        info!(operation = request.name(), "Running tailscale operation");

        let result = self
            .runner
            .run(&self.binary, &args, self.timeout, cancel)
            .await;
        ResponseEnvelope::from_result(result)
    }

    /// Validate then run; rejected input never reaches the runner
    async fn validated(
        &self,
        request: Result<OperationRequest, ValidationError>,
    ) -> ResponseEnvelope<String> {
        match request {
            Ok(request) => self.run(&request).await,
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "Rejected tool input");
                ResponseEnvelope::from_validation(&e)
            }
        }
    }

    /// `tailscale ping <target> [-c <count>]`
    pub async fn ping(&self, target: &str, count: Option<f64>) -> ResponseEnvelope<String> {
        self.validated(OperationRequest::ping(target, count)).await
    }

    /// `tailscale up [options]`
    pub async fn up(&self, options: &RawUpOptions) -> ResponseEnvelope<String> {
        self.validated(OperationRequest::up(options)).await
    }

    /// `tailscale down`
    pub async fn down(&self) -> ResponseEnvelope<String> {
        self.run(&OperationRequest::Down).await
    }

    /// `tailscale set --exit-node <id>`; `None` clears the exit node
    pub async fn set_exit_node(&self, node_id: Option<&str>) -> ResponseEnvelope<String> {
        self.validated(OperationRequest::set_exit_node(node_id)).await
    }

    /// `tailscale set --shields-up=<enabled>`
    pub async fn set_shields_up(&self, enabled: bool) -> ResponseEnvelope<String> {
        self.run(&OperationRequest::SetShieldsUp { enabled }).await
    }

    /// `tailscale version`, raw text
    pub async fn version(&self) -> ResponseEnvelope<String> {
        self.run(&OperationRequest::Version).await
    }

    /// `tailscale version`, parsed
    pub async fn version_info(&self) -> ResponseEnvelope<VersionInfo> {
        self.version()
            .await
            .and_then_parse("version", |data| VersionInfo::parse(&data))
    }

    /// `tailscale netcheck`
    pub async fn netcheck(&self) -> ResponseEnvelope<String> {
        self.run(&OperationRequest::Netcheck).await
    }

    /// `tailscale logout`
    pub async fn logout(&self) -> ResponseEnvelope<String> {
        self.run(&OperationRequest::Logout).await
    }

    /// `tailscale status --json`, parsed
    pub async fn status(&self) -> ResponseEnvelope<StatusSummary> {
        self.run(&OperationRequest::Status)
            .await
            .parse_json("status")
    }
}
