pub mod client;
pub mod exchange;
pub mod failover;

pub use client::{UpstreamAnswer, UpstreamClient};
pub use exchange::{ExchangeResponse, NetworkExchange, UpstreamExchange};
pub use failover::{Attempt, FailoverState};
