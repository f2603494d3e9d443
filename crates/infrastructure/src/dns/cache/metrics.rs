use ferrous_forwarder_application::ports::CacheMetricsSnapshot;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

// align(64) keeps `hits` and `misses` on their own cache line.
#[derive(Default)]
#[repr(align(64))]
pub struct CacheMetrics {
    // Hot counters, touched on every lookup.
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    _hot_pad: [u64; 6],

    pub negative_hits: AtomicU64,
    pub insertions: AtomicU64,
    pub evictions: AtomicU64,
    pub expirations: AtomicU64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(AtomicOrdering::Relaxed) as f64;
        let total = hits + self.misses.load(AtomicOrdering::Relaxed) as f64;

        if total > 0.0 {
            (hits / total) * 100.0
        } else {
            0.0
        }
    }

    pub fn snapshot(&self, total_entries: usize) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            total_entries,
            hits: self.hits.load(AtomicOrdering::Relaxed),
            negative_hits: self.negative_hits.load(AtomicOrdering::Relaxed),
            misses: self.misses.load(AtomicOrdering::Relaxed),
            insertions: self.insertions.load(AtomicOrdering::Relaxed),
            evictions: self.evictions.load(AtomicOrdering::Relaxed),
            expirations: self.expirations.load(AtomicOrdering::Relaxed),
            hit_rate: self.hit_rate(),
        }
    }
}
