pub mod cache;
pub mod dns;

pub use cache::GetCacheStatsUseCase;
pub use dns::HandleDnsQueryUseCase;
