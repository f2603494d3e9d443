pub mod mock_repositories;

#[allow(unused_imports)]
pub use mock_repositories::{cache_miss, resolution_failed, MockCacheMaintenancePort, RecordingSink};
