use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    /// Number of SO_REUSEPORT sockets per protocol.
    #[serde(default = "default_workers")]
    pub udp_workers: usize,

    #[serde(default = "default_tcp_idle_timeout_secs")]
    pub tcp_idle_timeout_secs: u64,

    /// Queries processed concurrently on a single TCP connection.
    #[serde(default = "default_tcp_max_pipelined")]
    pub tcp_max_pipelined: usize,
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.dns_port)
        } else {
            format!("{}:{}", self.bind_address, self.dns_port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            dns_port: default_dns_port(),
            udp_workers: default_workers(),
            tcp_idle_timeout_secs: default_tcp_idle_timeout_secs(),
            tcp_max_pipelined: default_tcp_max_pipelined(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_dns_port() -> u16 {
    53
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, 8)
}

fn default_tcp_idle_timeout_secs() -> u64 {
    10
}

fn default_tcp_max_pipelined() -> usize {
    16
}
