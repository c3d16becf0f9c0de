// tailscale-mcp - Main Entry Point
//
// Runs one tailscale operation through the validated execution pipeline and
// prints its response envelope as JSON on stdout. Logs go to stderr.
// Ctrl-C kills the running tailscale process and reports a cancellation.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tailscale_mcp::tools::{CancelSignal, ValidationError};
use tailscale_mcp::{
    logging, Config, OperationRequest, RawUpOptions, ResponseEnvelope, StatusSummary, TailscaleCli,
};
use tracing::{debug, info};

/// Injection-safe tailscale operations for MCP tool servers
#[derive(Parser, Debug)]
#[command(name = "tailscale-mcp")]
#[command(version)]
#[command(about = "Injection-safe tailscale operations for MCP tool servers", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the tailscale binary
    #[arg(long)]
    binary: Option<String>,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping a peer
    Ping {
        /// Peer hostname, IP or node id
        target: String,

        /// Number of pings (1-100)
        #[arg(short = 'c', long, allow_negative_numbers = true)]
        count: Option<f64>,
    },
    /// Connect to the tailnet
    Up {
        #[arg(long)]
        login_server: Option<String>,

        #[arg(long)]
        hostname: Option<String>,

        /// Comma-separated CIDR routes to advertise
        #[arg(long)]
        advertise_routes: Option<String>,

        #[arg(long = "authkey")]
        auth_key: Option<String>,

        #[arg(long)]
        accept_routes: bool,

        /// Do not accept DNS configuration from the tailnet
        #[arg(long)]
        no_accept_dns: bool,
    },
    /// Disconnect from the tailnet
    Down,
    /// Set or clear the exit node
    SetExitNode {
        /// Node to route through; omit to clear
        node_id: Option<String>,
    },
    /// Block or allow incoming connections
    ShieldsUp {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    /// Show the tailscale version
    Version,
    /// Report network conditions
    Netcheck,
    /// Log out of the tailnet
    Logout,
    /// Show tailnet status
    Status,
}

impl Commands {
    fn into_request(self) -> Result<OperationRequest, ValidationError> {
        match self {
            Commands::Ping { target, count } => OperationRequest::ping(&target, count),
            Commands::Up {
                login_server,
                hostname,
                advertise_routes,
                auth_key,
                accept_routes,
                no_accept_dns,
            } => OperationRequest::up(&RawUpOptions {
                login_server,
                hostname,
                advertise_routes: advertise_routes.map(|routes| split_routes(&routes)),
                auth_key,
                accept_routes,
                accept_dns: Some(!no_accept_dns),
            }),
            Commands::Down => Ok(OperationRequest::Down),
            Commands::SetExitNode { node_id } => {
                OperationRequest::set_exit_node(node_id.as_deref())
            }
            Commands::ShieldsUp { enabled } => Ok(OperationRequest::SetShieldsUp { enabled }),
            Commands::Version => Ok(OperationRequest::Version),
            Commands::Netcheck => Ok(OperationRequest::Netcheck),
            Commands::Logout => Ok(OperationRequest::Logout),
            Commands::Status => Ok(OperationRequest::Status),
        }
    }
}

fn split_routes(routes: &str) -> Vec<String> {
    if routes.trim().is_empty() {
        return Vec::new();
    }
    routes.split(',').map(|r| r.trim().to_string()).collect()
}

fn ctrl_c() -> CancelSignal {
    Box::pin(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
        } else {
            std::future::pending::<()>().await;
        }
    })
}

fn print_envelope<T: Serialize>(envelope: &ResponseEnvelope<T>) -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(envelope).context("Failed to serialize response")?;
    println!("{}", json);
    Ok(if envelope.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(binary) = args.binary {
        config.tailscale.binary = binary;
    }
    if let Some(timeout) = args.timeout {
        config.tailscale.timeout_secs = timeout;
    }
    config.validate()?;

    logging::init(&config.logging, args.verbose)?;
    debug!(
        binary = %config.tailscale.binary,
        timeout_secs = config.tailscale.timeout_secs,
        "Configuration loaded"
    );

    let request = match args.command.into_request() {
        Ok(request) => request,
        Err(e) => return print_envelope(&ResponseEnvelope::<String>::from_validation(&e)),
    };

    let cli = TailscaleCli::new(&config.cli_config());
    let envelope = cli.run_with_cancel(&request, ctrl_c()).await;

    match request {
        OperationRequest::Status => print_envelope(&envelope.parse_json::<StatusSummary>("status")),
        _ => print_envelope(&envelope),
    }
}
