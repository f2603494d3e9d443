use async_trait::async_trait;
use ferrous_forwarder_domain::{ClientContext, Message};

/// Turns a decoded client query into the response that client should receive.
///
/// Implementations never fail: upstream and transport errors are folded into
/// a DNS response code (typically SERVFAIL) on the returned message.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, request: &Message, client: &ClientContext) -> Message;
}
