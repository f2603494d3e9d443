pub mod cache;
pub mod cache_maintenance;
pub mod coordinator;
pub mod events;
pub mod interceptors;
pub mod server;
pub mod transport;
pub mod upstream;
pub mod wire;

pub use cache::{CacheKey, CacheMetrics, CachedAnswer, Clock, CoarseClock, DnsCache, TtlPolicy};
pub use cache_maintenance::DnsCacheMaintenance;
pub use coordinator::QueryCoordinator;
pub use events::{QueryEventEmitter, QueryMetrics};
pub use interceptors::LoggingInterceptor;
pub use server::DnsServerHandler;
pub use upstream::{
    FailoverState, NetworkExchange, UpstreamAnswer, UpstreamClient, UpstreamExchange,
};
