pub mod emitter;
pub mod metrics;

pub use emitter::QueryEventEmitter;
pub use ferrous_forwarder_domain::QueryEvent;
pub use metrics::QueryMetrics;
