//! UDP transport for upstream queries (RFC 1035 §4.2.1).
//!
//! Messages are sent unframed from a fresh ephemeral socket connected to the
//! upstream, so the kernel discards datagrams from any other source. A reply
//! with TC set is returned as-is; the caller decides whether to retry over TCP.

use super::{map_io_error, timeout_error, DnsTransport, TransportResponse};
use async_trait::async_trait;
use ferrous_forwarder_domain::client_context::UDP_MAX_PAYLOAD;
use ferrous_forwarder_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let server = self.server_addr;

        let exchange = async {
            let socket = UdpSocket::bind(self.bind_addr())
                .await
                .map_err(|e| map_io_error(server, e))?;
            socket
                .connect(server)
                .await
                .map_err(|e| map_io_error(server, e))?;

            let bytes_sent = socket
                .send(message_bytes)
                .await
                .map_err(|e| map_io_error(server, e))?;
            debug!(server = %server, bytes_sent, "UDP query sent");

            let mut recv_buf = vec![0u8; UDP_MAX_PAYLOAD];
            let bytes_received = socket
                .recv(&mut recv_buf)
                .await
                .map_err(|e| map_io_error(server, e))?;
            recv_buf.truncate(bytes_received);
            debug!(server = %server, bytes_received, "UDP response received");

            Ok::<_, DomainError>(recv_buf)
        };

        let bytes = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| timeout_error(server))??;

        Ok(TransportResponse {
            bytes,
            protocol_used: "UDP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
