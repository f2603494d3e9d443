pub mod mock_repositories;

pub use mock_repositories::{MockDnsCache, MockDnsResolver, RecordingInterceptor};
