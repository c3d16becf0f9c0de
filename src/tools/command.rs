//! Command Builder
//!
//! Maps a validated [`OperationRequest`] to the argument vector passed to the
//! tailscale binary. Literal flags and caller values always occupy separate
//! slots; nothing here ever produces a shell string.

use super::validator::{Count, OpaqueToken, RouteList, ValidationError};
use std::fmt;

/// Flags whose following value must not appear in logs
const SECRET_FLAGS: [&str; 1] = ["--authkey"];

/// Placeholder logged in place of secret values
const REDACTED: &str = "<redacted>";

/// Options for `tailscale up`, all validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpOptions {
    pub login_server: Option<OpaqueToken>,
    pub hostname: Option<OpaqueToken>,
    pub advertise_routes: Option<RouteList>,
    pub auth_key: Option<OpaqueToken>,
    pub accept_routes: bool,
    pub accept_dns: bool,
}

impl Default for UpOptions {
    fn default() -> Self {
        Self {
            login_server: None,
            hostname: None,
            advertise_routes: None,
            auth_key: None,
            accept_routes: false,
            accept_dns: true,
        }
    }
}

/// Unvalidated `tailscale up` options as received from a tool call
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawUpOptions {
    pub login_server: Option<String>,
    pub hostname: Option<String>,
    pub advertise_routes: Option<Vec<String>>,
    pub auth_key: Option<String>,
    pub accept_routes: bool,
    pub accept_dns: Option<bool>,
}

impl RawUpOptions {
    /// Validate every field, stopping at the first rejection
    pub fn validate(&self) -> Result<UpOptions, ValidationError> {
        Ok(UpOptions {
            login_server: self
                .login_server
                .as_deref()
                .map(|v| OpaqueToken::new("loginServer", v))
                .transpose()?,
            hostname: self
                .hostname
                .as_deref()
                .map(|v| OpaqueToken::new("hostname", v))
                .transpose()?,
            advertise_routes: self
                .advertise_routes
                .as_ref()
                .map(RouteList::new)
                .transpose()?,
            auth_key: self
                .auth_key
                .as_deref()
                .map(|v| OpaqueToken::new("authKey", v))
                .transpose()?,
            accept_routes: self.accept_routes,
            accept_dns: self.accept_dns.unwrap_or(true),
        })
    }
}

/// One tailscale operation with validated inputs
///
/// Every variant can only be built from validated newtypes, so holding an
/// `OperationRequest` means validation already passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    Ping {
        target: OpaqueToken,
        count: Option<Count>,
    },
    Up(UpOptions),
    SetExitNode {
        node_id: Option<OpaqueToken>,
    },
    SetShieldsUp {
        enabled: bool,
    },
    Down,
    Version,
    Netcheck,
    Logout,
    Status,
}

impl OperationRequest {
    /// Build a ping request from raw tool arguments
    pub fn ping(target: &str, count: Option<f64>) -> Result<Self, ValidationError> {
        let target = OpaqueToken::new("target", target)?;
        let count = count.map(Count::new).transpose()?;
        Ok(OperationRequest::Ping { target, count })
    }

    /// Build an up request from raw tool arguments
    pub fn up(options: &RawUpOptions) -> Result<Self, ValidationError> {
        Ok(OperationRequest::Up(options.validate()?))
    }

    /// Build a set-exit-node request; `None` clears the exit node
    pub fn set_exit_node(node_id: Option<&str>) -> Result<Self, ValidationError> {
        let node_id = node_id.map(|v| OpaqueToken::new("nodeId", v)).transpose()?;
        Ok(OperationRequest::SetExitNode { node_id })
    }

    /// Short operation name, used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            OperationRequest::Ping { .. } => "ping",
            OperationRequest::Up(_) => "up",
            OperationRequest::SetExitNode { .. } => "set-exit-node",
            OperationRequest::SetShieldsUp { .. } => "set-shields-up",
            OperationRequest::Down => "down",
            OperationRequest::Version => "version",
            OperationRequest::Netcheck => "netcheck",
            OperationRequest::Logout => "logout",
            OperationRequest::Status => "status",
        }
    }

    /// Produce the argument vector for this request
    pub fn build(&self) -> ArgumentVector {
        let mut args = ArgumentVector::default();
        match self {
            OperationRequest::Ping { target, count } => {
                args.literal("ping").value(target.as_str());
                if let Some(count) = count {
                    args.literal("-c").value(count.to_string());
                }
            }
            OperationRequest::Up(options) => {
                args.literal("up");
                if let Some(server) = &options.login_server {
                    args.literal("--login-server").value(server.as_str());
                }
                if let Some(hostname) = &options.hostname {
                    args.literal("--hostname").value(hostname.as_str());
                }
                if let Some(routes) = &options.advertise_routes {
                    args.literal("--advertise-routes").value(routes.joined());
                }
                if let Some(key) = &options.auth_key {
                    args.literal("--authkey").value(key.as_str());
                }
                if options.accept_routes {
                    args.literal("--accept-routes");
                }
                if !options.accept_dns {
                    args.literal("--accept-dns=false");
                }
            }
            OperationRequest::SetExitNode { node_id } => {
                // An empty value clears the exit node
                let node_id = node_id.as_ref().map(OpaqueToken::as_str).unwrap_or("");
                args.literal("set").literal("--exit-node").value(node_id);
            }
            OperationRequest::SetShieldsUp { enabled } => {
                args.literal("set").literal(if *enabled {
                    "--shields-up=true"
                } else {
                    "--shields-up=false"
                });
            }
            OperationRequest::Down => {
                args.literal("down");
            }
            OperationRequest::Version => {
                args.literal("version");
            }
            OperationRequest::Netcheck => {
                args.literal("netcheck");
            }
            OperationRequest::Logout => {
                args.literal("logout");
            }
            OperationRequest::Status => {
                args.literal("status").literal("--json");
            }
        }
        args
    }
}

/// Ordered discrete arguments for a single process invocation
///
/// The program itself is never part of the vector. The only way to obtain a
/// non-empty vector is [`OperationRequest::build`]; raw strings can not be
/// turned into one:
///
/// ```compile_fail
/// use tailscale_mcp::tools::ArgumentVector;
///
/// let args = ArgumentVector::from(vec!["ping".to_string(), "--help".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentVector {
    args: Vec<String>,
}

impl ArgumentVector {
    /// Append a fixed token chosen by this crate
    fn literal(&mut self, token: &'static str) -> &mut Self {
        self.args.push(token.to_string());
        self
    }

    /// Append a caller-supplied value as its own slot
    fn value(&mut self, value: impl Into<String>) -> &mut Self {
        self.args.push(value.into());
        self
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Copy with the values of secret flags replaced, for logging
    pub fn redacted(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len());
        let mut hide_next = false;
        for arg in &self.args {
            if hide_next {
                out.push(REDACTED.to_string());
                hide_next = false;
                continue;
            }
            hide_next = SECRET_FLAGS.contains(&arg.as_str());
            out.push(arg.clone());
        }
        out
    }
}

#[cfg(test)]
impl From<Vec<String>> for ArgumentVector {
    fn from(args: Vec<String>) -> Self {
        Self { args }
    }
}

impl fmt::Display for ArgumentVector {
    /// Redacted, debug-quoted rendering
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.redacted())
    }
}
