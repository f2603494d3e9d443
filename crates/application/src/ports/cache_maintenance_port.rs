use async_trait::async_trait;
use ferrous_forwarder_domain::DomainError;

/// Outcome of a cache sweep cycle.
#[derive(Debug, Default, Clone)]
pub struct CacheSweepOutcome {
    pub entries_removed: usize,
    pub cache_size: usize,
}

/// Port for periodic cache maintenance.
#[async_trait]
pub trait CacheMaintenancePort: Send + Sync {
    /// Advance the cache clock. Called roughly once per second.
    fn tick(&self);

    /// Remove expired entries to reclaim memory.
    async fn run_sweep_cycle(&self) -> Result<CacheSweepOutcome, DomainError>;
}
