use super::cache::{coarse_clock, Clock, DnsCache};

use async_trait::async_trait;
use ferrous_forwarder_application::ports::{CacheMaintenancePort, CacheSweepOutcome};
use ferrous_forwarder_domain::DomainError;
use std::sync::Arc;
use tracing::debug;

/// Infrastructure adapter implementing `CacheMaintenancePort`.
pub struct DnsCacheMaintenance {
    cache: Arc<DnsCache>,
    clock: Arc<dyn Clock>,
}

impl DnsCacheMaintenance {
    pub fn new(cache: Arc<DnsCache>, clock: Arc<dyn Clock>) -> Self {
        Self { cache, clock }
    }
}

#[async_trait]
impl CacheMaintenancePort for DnsCacheMaintenance {
    fn tick(&self) {
        coarse_clock::tick();
    }

    async fn run_sweep_cycle(&self) -> Result<CacheSweepOutcome, DomainError> {
        let cache_for_sweep = Arc::clone(&self.cache);
        let now = self.clock.now_secs();
        let removed = match tokio::task::spawn_blocking(move || cache_for_sweep.sweep(now)).await {
            Ok(count) => count,
            Err(e) => {
                debug!(error = %e, "Sweep task panicked");
                0
            }
        };

        Ok(CacheSweepOutcome {
            entries_removed: removed,
            cache_size: self.cache.len(),
        })
    }
}
