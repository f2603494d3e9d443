use ferrous_forwarder_application::ports::CacheMaintenancePort;
use ferrous_forwarder_application::use_cases::HandleDnsQueryUseCase;
use ferrous_forwarder_domain::{Config, QueryEvent};
use ferrous_forwarder_infrastructure::dns::{
    CoarseClock, DnsCache, DnsCacheMaintenance, LoggingInterceptor, NetworkExchange,
    QueryCoordinator, QueryEventEmitter, QueryMetrics, UpstreamClient,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

pub struct DnsServices {
    pub cache: Arc<DnsCache>,
    pub handler_use_case: Arc<HandleDnsQueryUseCase>,
    pub cache_maintenance: Arc<dyn CacheMaintenancePort>,
    pub query_metrics: Arc<QueryMetrics>,
    pub events: mpsc::UnboundedReceiver<QueryEvent>,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        info!(
            upstreams = ?config.upstream.servers,
            attempt_budget = config.upstream.effective_attempt_budget(),
            "Initializing DNS forwarding services"
        );

        let (emitter, events) = QueryEventEmitter::new_enabled();
        let clock = Arc::new(CoarseClock);
        let cache = Arc::new(DnsCache::new(&config.cache));

        let upstream = UpstreamClient::from_config(&config.upstream, Arc::new(NetworkExchange::new()))?
            .with_emitter(emitter.clone());

        let coordinator = QueryCoordinator::new(cache.clone(), Arc::new(upstream), clock.clone())
            .with_emitter(emitter)
            .with_edns_payload_size(config.upstream.edns_payload_size);

        let handler_use_case = Arc::new(
            HandleDnsQueryUseCase::new(Arc::new(coordinator))
                .with_request_interceptor(Arc::new(LoggingInterceptor::new("request")))
                .with_response_interceptor(Arc::new(LoggingInterceptor::new("response"))),
        );

        let cache_maintenance: Arc<dyn CacheMaintenancePort> =
            Arc::new(DnsCacheMaintenance::new(cache.clone(), clock));

        Ok(Self {
            cache,
            handler_use_case,
            cache_maintenance,
            query_metrics: Arc::new(QueryMetrics::default()),
            events,
        })
    }
}
