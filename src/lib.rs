//! tailscale-mcp Library
//!
//! Injection-safe execution of `tailscale` CLI operations for MCP tool
//! servers. Tool arguments are validated, turned into argument vectors and
//! executed without a shell; every operation answers with a
//! [`tools::ResponseEnvelope`].

pub mod config;
pub mod logging;
pub mod tailscale;
pub mod tools;

pub use config::Config;
pub use tailscale::{StatusSummary, TailscaleCli, TailscaleCliConfig, VersionInfo};
pub use tools::{ErrorKind, OperationRequest, RawUpOptions, ResponseEnvelope};
