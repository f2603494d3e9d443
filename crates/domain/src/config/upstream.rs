use crate::dns_protocol::DnsProtocol;
use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Tried in order; the first entry has the highest priority.
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// Overall deadline for one client-visible resolution, across all attempts.
    #[serde(default = "default_query_deadline_ms")]
    pub query_deadline_ms: u64,

    /// Total attempts shared by all servers. Defaults to one attempt per server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_budget: Option<usize>,

    /// UDP payload size advertised to upstreams via EDNS(0).
    #[serde(default = "default_edns_payload_size")]
    pub edns_payload_size: u16,
}

impl UpstreamConfig {
    pub fn parsed_servers(&self) -> Result<Vec<DnsProtocol>, ConfigError> {
        self.servers
            .iter()
            .map(|s| s.parse::<DnsProtocol>().map_err(ConfigError::Validation))
            .collect()
    }

    pub fn effective_attempt_budget(&self) -> usize {
        self.attempt_budget.unwrap_or(self.servers.len())
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            query_deadline_ms: default_query_deadline_ms(),
            attempt_budget: None,
            edns_payload_size: default_edns_payload_size(),
        }
    }
}

fn default_servers() -> Vec<String> {
    vec!["8.8.8.8:53".to_string(), "1.1.1.1:53".to_string()]
}

fn default_attempt_timeout_ms() -> u64 {
    2000
}

fn default_query_deadline_ms() -> u64 {
    5000
}

fn default_edns_payload_size() -> u16 {
    1232
}
