use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_shard_amount")]
    pub shard_amount: usize,

    #[serde(default = "default_min_ttl")]
    pub min_ttl: u32,

    #[serde(default = "default_max_ttl")]
    pub max_ttl: u32,

    /// Lifetime of NXDOMAIN/NODATA entries, lowered by the SOA minimum when present.
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl: u32,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            shard_amount: default_shard_amount(),
            min_ttl: default_min_ttl(),
            max_ttl: default_max_ttl(),
            negative_ttl: default_negative_ttl(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    200_000
}

fn default_shard_amount() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cpus * 4).next_power_of_two().clamp(8, 256)
}

fn default_min_ttl() -> u32 {
    1
}

fn default_max_ttl() -> u32 {
    86_400
}

fn default_negative_ttl() -> u32 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}
