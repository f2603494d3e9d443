pub mod cache_maintenance;
pub mod query_event_logger;
pub mod runner;

pub use cache_maintenance::CacheMaintenanceJob;
pub use query_event_logger::QueryEventLoggerJob;
pub use runner::JobRunner;
