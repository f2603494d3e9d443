use crate::dns::transport::{timeout_error, DnsTransport, TcpTransport, UdpTransport};
use crate::dns::wire;
use async_trait::async_trait;
use ferrous_forwarder_domain::client_context::TCP_MAX_MESSAGE;
use ferrous_forwarder_domain::{DnsProtocol, DomainError, Message};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub message: Message,
    pub protocol_used: &'static str,
}

/// Sends one query to one upstream and returns its decoded reply.
/// Identity checks and failover live above this seam.
#[async_trait]
pub trait UpstreamExchange: Send + Sync {
    async fn exchange(
        &self,
        server: &DnsProtocol,
        query: &Message,
        timeout: Duration,
    ) -> Result<ExchangeResponse, DomainError>;
}

/// Real network exchange: UDP first, the identical query again over TCP when
/// the UDP reply is truncated. `tcp://` upstreams go straight to TCP.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkExchange;

impl NetworkExchange {
    pub fn new() -> Self {
        Self
    }

    async fn over_tcp(
        addr: SocketAddr,
        query_bytes: &[u8],
        timeout: Duration,
    ) -> Result<ExchangeResponse, DomainError> {
        let response = TcpTransport::new(addr).send(query_bytes, timeout).await?;
        Ok(ExchangeResponse {
            message: wire::decode(&response.bytes)?,
            protocol_used: response.protocol_used,
        })
    }
}

#[async_trait]
impl UpstreamExchange for NetworkExchange {
    async fn exchange(
        &self,
        server: &DnsProtocol,
        query: &Message,
        timeout: Duration,
    ) -> Result<ExchangeResponse, DomainError> {
        let started = Instant::now();
        let query_bytes = wire::encode(query, TCP_MAX_MESSAGE)?;

        let addr = match server {
            DnsProtocol::Tcp { addr } => return Self::over_tcp(*addr, &query_bytes, timeout).await,
            DnsProtocol::Udp { addr } => *addr,
        };

        let response = UdpTransport::new(addr).send(&query_bytes, timeout).await?;
        let message = wire::decode(&response.bytes)?;
        if !message.is_truncated() {
            return Ok(ExchangeResponse {
                message,
                protocol_used: response.protocol_used,
            });
        }

        let remaining = timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(timeout_error(addr));
        }
        debug!(server = %addr, "Response truncated (TC bit), retrying via TCP");
        Self::over_tcp(addr, &query_bytes, remaining).await
    }
}
