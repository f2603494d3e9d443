mod helpers;

use ferrous_forwarder_application::ports::CacheMetricsSnapshot;
use ferrous_forwarder_application::use_cases::GetCacheStatsUseCase;
use helpers::MockDnsCache;
use std::sync::Arc;

#[test]
fn test_get_cache_stats_returns_snapshot() {
    let snapshot = CacheMetricsSnapshot {
        total_entries: 12,
        hits: 30,
        misses: 10,
        hit_rate: 75.0,
        ..CacheMetricsSnapshot::default()
    };
    let use_case = GetCacheStatsUseCase::new(Arc::new(MockDnsCache::new(snapshot.clone())));

    assert_eq!(use_case.execute(), snapshot);
}
