use ferrous_forwarder_application::use_cases::GetCacheStatsUseCase;
use ferrous_forwarder_infrastructure::dns::DnsCache;
use std::sync::Arc;

pub struct UseCases {
    pub get_cache_stats: Arc<GetCacheStatsUseCase>,
}

impl UseCases {
    pub fn new(cache: Arc<DnsCache>) -> Self {
        Self {
            get_cache_stats: Arc::new(GetCacheStatsUseCase::new(cache)),
        }
    }
}
