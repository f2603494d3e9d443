use ferrous_forwarder_application::ports::CacheMaintenancePort;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Keeps the coarse cache clock current and sweeps expired entries.
pub struct CacheMaintenanceJob {
    maintenance: Arc<dyn CacheMaintenancePort>,
    tick_interval: Duration,
    sweep_interval: Duration,
    shutdown: CancellationToken,
}

impl CacheMaintenanceJob {
    pub fn new(maintenance: Arc<dyn CacheMaintenancePort>) -> Self {
        Self {
            maintenance,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_sweep_interval(mut self, sweep_secs: u64) -> Self {
        self.sweep_interval = Duration::from_secs(sweep_secs.max(1));
        self
    }

    pub fn with_tick_interval(mut self, tick: Duration) -> Self {
        self.tick_interval = tick;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            sweep_interval_secs = self.sweep_interval.as_secs(),
            "Starting cache maintenance background jobs"
        );

        let tick_job = Arc::clone(&self);
        let tick_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_job.tick_interval);
            loop {
                tokio::select! {
                    _ = tick_shutdown.cancelled() => {
                        info!("CacheMaintenanceJob (clock): shutting down");
                        break;
                    }
                    _ = interval.tick() => tick_job.maintenance.tick(),
                }
            }
        });

        let sweep_job = Arc::clone(&self);
        let sweep_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_job.sweep_interval);
            // the first tick of an interval completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = sweep_shutdown.cancelled() => {
                        info!("CacheMaintenanceJob (sweep): shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match sweep_job.maintenance.run_sweep_cycle().await {
                            Ok(outcome) => {
                                if outcome.entries_removed > 0 {
                                    info!(
                                        entries_removed = outcome.entries_removed,
                                        cache_size = outcome.cache_size,
                                        "Cache sweep cycle completed"
                                    );
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "Cache sweep cycle failed");
                            }
                        }
                    }
                }
            }
        });
    }
}
