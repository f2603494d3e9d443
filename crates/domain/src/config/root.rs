use serde::{Deserialize, Serialize};

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;

const LOCAL_CONFIG_PATH: &str = "ferrous-forwarder.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/ferrous-forwarder/config.toml";

/// Main configuration structure for Ferrous Forwarder
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (bind address, port, TCP limits)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream resolvers and retry policy
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Answer cache bounds
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-forwarder.toml in current directory
    /// 3. /etc/ferrous-forwarder/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if !overrides.upstreams.is_empty() {
            self.upstream.servers = overrides.upstreams;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.server.tcp_max_pipelined == 0 {
            return Err(ConfigError::Validation(
                "tcp_max_pipelined must be at least 1".to_string(),
            ));
        }

        if self.upstream.servers.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }

        self.upstream.parsed_servers()?;

        if self.upstream.attempt_timeout_ms == 0 || self.upstream.query_deadline_ms == 0 {
            return Err(ConfigError::Validation(
                "Upstream timeouts must be greater than 0".to_string(),
            ));
        }

        if self.upstream.effective_attempt_budget() == 0 {
            return Err(ConfigError::Validation(
                "attempt_budget must be at least 1".to_string(),
            ));
        }

        if !(512..=4096).contains(&self.upstream.edns_payload_size) {
            return Err(ConfigError::Validation(format!(
                "edns_payload_size ({}) must be between 512 and 4096",
                self.upstream.edns_payload_size
            )));
        }

        if self.cache.enabled && (self.cache.max_entries == 0 || self.cache.shard_amount == 0) {
            return Err(ConfigError::Validation(
                "Cache capacity and shard amount must be greater than 0".to_string(),
            ));
        }

        if self.cache.min_ttl > self.cache.max_ttl {
            return Err(ConfigError::Validation(format!(
                "cache min_ttl ({}) exceeds max_ttl ({})",
                self.cache.min_ttl, self.cache.max_ttl
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Some(LOCAL_CONFIG_PATH.to_string())
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Some(SYSTEM_CONFIG_PATH.to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub upstreams: Vec<String>,
    pub log_level: Option<String>,
}
