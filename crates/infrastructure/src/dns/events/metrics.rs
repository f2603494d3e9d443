use super::QueryEvent;
use dashmap::DashMap;
use ferrous_forwarder_application::ports::QueryEventSink;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Aggregated counters over the query event stream.
#[derive(Clone, Default)]
pub struct QueryMetrics {
    total_events: Arc<AtomicU64>,

    cache_hits: Arc<AtomicU64>,

    cache_misses: Arc<AtomicU64>,

    dedup_merges: Arc<AtomicU64>,

    upstream_answers: Arc<AtomicU64>,

    upstream_failures: Arc<AtomicU64>,

    resolution_failures: Arc<AtomicU64>,

    total_upstream_time_us: Arc<AtomicU64>,

    upstream_failure_counts: Arc<DashMap<SocketAddr, u64>>,

    error_kind_counts: Arc<DashMap<&'static str, u64>>,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, event: &QueryEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        match event {
            QueryEvent::CacheHit { .. } => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
            }
            QueryEvent::CacheMiss { .. } => {
                self.cache_misses.fetch_add(1, Ordering::Relaxed);
            }
            QueryEvent::DedupMerge { .. } => {
                self.dedup_merges.fetch_add(1, Ordering::Relaxed);
            }
            QueryEvent::UpstreamAnswer {
                response_time_us, ..
            } => {
                self.upstream_answers.fetch_add(1, Ordering::Relaxed);
                self.total_upstream_time_us
                    .fetch_add(*response_time_us, Ordering::Relaxed);
            }
            QueryEvent::UpstreamFailure {
                server, error_kind, ..
            } => {
                self.upstream_failures.fetch_add(1, Ordering::Relaxed);
                *self.upstream_failure_counts.entry(*server).or_insert(0) += 1;
                *self.error_kind_counts.entry(*error_kind).or_insert(0) += 1;
            }
            QueryEvent::ResolutionFailed { error_kind, .. } => {
                self.resolution_failures.fetch_add(1, Ordering::Relaxed);
                *self.error_kind_counts.entry(*error_kind).or_insert(0) += 1;
            }
        }
    }

    pub fn total_events(&self) -> u64 {
        self.total_events.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn dedup_merges(&self) -> u64 {
        self.dedup_merges.load(Ordering::Relaxed)
    }

    pub fn upstream_answers(&self) -> u64 {
        self.upstream_answers.load(Ordering::Relaxed)
    }

    pub fn upstream_failures(&self) -> u64 {
        self.upstream_failures.load(Ordering::Relaxed)
    }

    pub fn resolution_failures(&self) -> u64 {
        self.resolution_failures.load(Ordering::Relaxed)
    }

    pub fn avg_upstream_time_us(&self) -> f64 {
        let answers = self.upstream_answers();
        if answers == 0 {
            return 0.0;
        }
        self.total_upstream_time_us.load(Ordering::Relaxed) as f64 / answers as f64
    }

    pub fn avg_upstream_time_ms(&self) -> f64 {
        self.avg_upstream_time_us() / 1000.0
    }

    pub fn upstream_failure_count(&self, server: SocketAddr) -> u64 {
        self.upstream_failure_counts
            .get(&server)
            .map(|v| *v)
            .unwrap_or(0)
    }

    pub fn error_kind_count(&self, kind: &str) -> u64 {
        self.error_kind_counts.get(kind).map(|v| *v).unwrap_or(0)
    }

    /// Upstreams ordered by failure count, worst first.
    pub fn top_failing_upstreams(&self, n: usize) -> Vec<(SocketAddr, u64)> {
        let mut servers: Vec<_> = self
            .upstream_failure_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();

        servers.sort_by(|a, b| b.1.cmp(&a.1));
        servers.truncate(n);
        servers
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_events,
            &self.cache_hits,
            &self.cache_misses,
            &self.dedup_merges,
            &self.upstream_answers,
            &self.upstream_failures,
            &self.resolution_failures,
            &self.total_upstream_time_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.upstream_failure_counts.clear();
        self.error_kind_counts.clear();
    }
}

impl QueryEventSink for QueryMetrics {
    fn record(&self, event: &QueryEvent) {
        self.track(event);
    }
}
