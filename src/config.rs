// Configuration File Support
//
// Configuration for the tailscale-mcp binary. TOML format with environment
// variable overrides, loaded from the platform config directory:
// ~/.config/tailscale-mcp/config.toml on Linux.

use crate::tailscale::{TailscaleCliConfig, DEFAULT_BINARY};
use crate::tools::{ExecutionTimeout, DEFAULT_TIMEOUT_SECS, MAX_OUTPUT_SIZE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "TAILSCALE_MCP_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// tailscale binary and execution limits
    pub tailscale: TailscaleConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// tailscale execution configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TailscaleConfig {
    /// Path to the tailscale binary, or a bare name resolved through PATH
    pub binary: String,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Maximum captured bytes per output stream
    pub max_output_size: usize,

    /// Maximum concurrently running tailscale processes
    pub max_concurrent: Option<usize>,
}

impl Default for TailscaleConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_output_size: MAX_OUTPUT_SIZE,
            max_concurrent: None,
        }
    }
}

impl Config {
    /// Load configuration from the default config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// Environment overrides are applied after the file is read, then the
    /// result is validated.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) =
            directories::ProjectDirs::from("com", "tailscale-mcp", "tailscale-mcp")
        {
            proj_dirs.config_dir().join("config.toml")
        } else {
            // Fallback if XDG dirs cannot be determined
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join("tailscale-mcp")
                .join("config.toml")
        }
    }

    /// Apply environment variable overrides from the process environment
    ///
    /// - TAILSCALE_MCP_LOG_LEVEL
    /// - TAILSCALE_MCP_LOG_FORMAT
    /// - TAILSCALE_MCP_BINARY
    /// - TAILSCALE_MCP_TIMEOUT_SECS
    /// - TAILSCALE_MCP_MAX_CONCURRENT
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; unparsable values are ignored
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(binary) = var("BINARY") {
            if !binary.is_empty() {
                self.tailscale.binary = binary;
            }
        }
        if let Some(timeout) = var("TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                if timeout > 0 {
                    self.tailscale.timeout_secs = timeout;
                }
            }
        }
        if let Some(limit) = var("MAX_CONCURRENT") {
            if let Ok(limit) = limit.parse::<usize>() {
                if limit > 0 {
                    self.tailscale.max_concurrent = Some(limit);
                }
            }
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.tailscale.binary.trim().is_empty() {
            anyhow::bail!("tailscale binary must not be empty");
        }
        if self.tailscale.timeout_secs == 0 {
            anyhow::bail!("tailscale timeout must be > 0 seconds");
        }
        if self.tailscale.max_output_size < 1024 {
            anyhow::bail!("tailscale max_output_size must be at least 1024 bytes");
        }
        if self.tailscale.max_concurrent == Some(0) {
            anyhow::bail!("tailscale max_concurrent must be > 0 when set");
        }

        Ok(())
    }

    /// Client settings derived from this configuration
    pub fn cli_config(&self) -> TailscaleCliConfig {
        TailscaleCliConfig {
            binary: PathBuf::from(&self.tailscale.binary),
            timeout: ExecutionTimeout::from_secs(self.tailscale.timeout_secs),
            max_output_size: self.tailscale.max_output_size,
            max_concurrent: self.tailscale.max_concurrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.tailscale.binary, "tailscale");
        assert_eq!(config.tailscale.timeout_secs, 30);
        assert_eq!(config.tailscale.max_concurrent, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_tailscale_limits() {
        let mut config = Config::default();
        config.tailscale.binary = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tailscale.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tailscale.max_output_size = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tailscale.max_concurrent = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_nonexistent_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().with_extension("nonexistent");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.tailscale.binary, Config::default().tailscale.binary);
    }

    #[test]
    fn test_load_valid_toml_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[logging]
level = "debug"
format = "json"

[tailscale]
binary = "/usr/local/bin/tailscale"
timeout_secs = 10
max_concurrent = 4
"#;
        fs::write(temp_file.path(), toml_content).unwrap();

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.tailscale.binary, "/usr/local/bin/tailscale");
        assert_eq!(config.tailscale.timeout_secs, 10);
        assert_eq!(config.tailscale.max_concurrent, Some(4));
        assert_eq!(config.tailscale.max_output_size, MAX_OUTPUT_SIZE);

        assert!(Config::load_from_path(temp_file.path()).is_ok());
    }

    #[test]
    fn test_load_invalid_toml_config() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[logging\nlevel = \"debug\"\n").unwrap();
        assert!(Config::load_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().apply_overrides(lookup(&[
            ("TAILSCALE_MCP_LOG_LEVEL", "debug"),
            ("TAILSCALE_MCP_LOG_FORMAT", "json"),
            ("TAILSCALE_MCP_BINARY", "/opt/tailscale"),
            ("TAILSCALE_MCP_TIMEOUT_SECS", "5"),
            ("TAILSCALE_MCP_MAX_CONCURRENT", "2"),
        ]));

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.tailscale.binary, "/opt/tailscale");
        assert_eq!(config.tailscale.timeout_secs, 5);
        assert_eq!(config.tailscale.max_concurrent, Some(2));
    }

    #[test]
    fn test_overrides_invalid_values() {
        let config = Config::default().apply_overrides(lookup(&[
            ("TAILSCALE_MCP_BINARY", ""),
            ("TAILSCALE_MCP_TIMEOUT_SECS", "0"),
            ("TAILSCALE_MCP_MAX_CONCURRENT", "many"),
        ]));

        // Should keep defaults for invalid values
        assert_eq!(config.tailscale.binary, "tailscale");
        assert_eq!(config.tailscale.timeout_secs, 30);
        assert_eq!(config.tailscale.max_concurrent, None);
    }

    #[test]
    fn test_cli_config() {
        let mut config = Config::default();
        config.tailscale.binary = "/usr/bin/tailscale".to_string();
        config.tailscale.timeout_secs = 7;
        config.tailscale.max_concurrent = Some(3);

        let cli = config.cli_config();
        assert_eq!(cli.binary, PathBuf::from("/usr/bin/tailscale"));
        assert_eq!(cli.timeout.duration(), Duration::from_secs(7));
        assert_eq!(cli.max_concurrent, Some(3));
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_valid_log_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let mut config = Config::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "Log level {} should be valid", level);
        }
    }
}
