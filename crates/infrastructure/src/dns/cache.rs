pub mod coarse_clock;
pub mod key;
pub mod metrics;
pub mod storage;
pub mod ttl_policy;

pub use coarse_clock::{Clock, CoarseClock};
pub use key::CacheKey;
pub use metrics::CacheMetrics;
pub use storage::{CachedAnswer, DnsCache};
pub use ttl_policy::TtlPolicy;
