mod cache_maintenance_port;
mod dns_cache_port;
mod dns_resolver;
mod query_event_sink;
mod query_interceptor;

pub use cache_maintenance_port::{CacheMaintenancePort, CacheSweepOutcome};
pub use dns_cache_port::{CacheMetricsSnapshot, DnsCachePort};
pub use dns_resolver::DnsResolver;
pub use query_event_sink::QueryEventSink;
pub use query_interceptor::QueryInterceptor;

// Re-export for convenience
pub use ferrous_forwarder_domain::{ClientContext, Message, QueryEvent};
