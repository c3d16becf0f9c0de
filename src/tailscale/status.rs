//! Structured views of tailscale output
//!
//! Only the fields the tool surface reports are modelled; everything else in
//! `tailscale status --json` is ignored.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Parsed `tailscale status --json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StatusSummary {
    pub version: String,

    /// Running, Stopped, NeedsLogin, ...
    pub backend_state: String,

    #[serde(rename = "MagicDNSSuffix")]
    pub magic_dns_suffix: String,

    #[serde(rename = "Self")]
    pub self_node: Option<PeerStatus>,

    /// Peers keyed by node public key
    #[serde(deserialize_with = "null_as_default")]
    pub peer: BTreeMap<String, PeerStatus>,

    #[serde(deserialize_with = "null_as_default")]
    pub health: Vec<String>,
}

/// One node as reported by `tailscale status --json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PeerStatus {
    #[serde(rename = "ID")]
    pub id: String,

    pub host_name: String,

    #[serde(rename = "DNSName")]
    pub dns_name: String,

    #[serde(rename = "OS")]
    pub os: String,

    #[serde(rename = "TailscaleIPs", deserialize_with = "null_as_default")]
    pub tailscale_ips: Vec<String>,

    pub online: bool,

    pub exit_node: bool,

    pub exit_node_option: bool,
}

/// tailscale emits `null` for empty collections
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl StatusSummary {
    pub fn is_running(&self) -> bool {
        self.backend_state == "Running"
    }

    /// Peers ordered by host name
    pub fn peers(&self) -> Vec<&PeerStatus> {
        let mut peers: Vec<&PeerStatus> = self.peer.values().collect();
        peers.sort_by(|a, b| a.host_name.cmp(&b.host_name));
        peers
    }

    pub fn online_peer_count(&self) -> usize {
        self.peer.values().filter(|p| p.online).count()
    }

    /// The peer currently used as exit node, if any
    pub fn exit_node(&self) -> Option<&PeerStatus> {
        self.peer.values().find(|p| p.exit_node)
    }
}

/// Parsed `tailscale version` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// First line, e.g. `1.70.0`
    pub version: String,

    /// Remaining `key: value` lines, e.g. `tailscale commit`
    pub details: BTreeMap<String, String>,
}

impl VersionInfo {
    pub fn parse(output: &str) -> Result<Self, String> {
        let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
        let version = lines
            .next()
            .ok_or_else(|| "empty version output".to_string())?
            .to_string();

        let details = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        Ok(Self { version, details })
    }
}
