/// Snapshot of DNS cache metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheMetricsSnapshot {
    pub total_entries: usize,
    pub hits: u64,
    pub negative_hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub hit_rate: f64,
}

/// Read-only view of the answer cache.
pub trait DnsCachePort: Send + Sync {
    fn cache_size(&self) -> usize;
    fn cache_metrics_snapshot(&self) -> CacheMetricsSnapshot;
}
