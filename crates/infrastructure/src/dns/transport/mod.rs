pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use ferrous_forwarder_domain::DomainError;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,

    pub protocol_used: &'static str,
}

/// One request/response round trip with a single upstream.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

pub(crate) fn map_io_error(server: SocketAddr, error: io::Error) -> DomainError {
    let server = server.to_string();
    match error.kind() {
        io::ErrorKind::ConnectionRefused => DomainError::TransportConnectionRefused { server },
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::BrokenPipe => DomainError::TransportConnectionReset { server },
        io::ErrorKind::TimedOut => DomainError::TransportTimeout { server },
        _ => DomainError::TransportError {
            server,
            reason: error.to_string(),
        },
    }
}

pub(crate) fn timeout_error(server: SocketAddr) -> DomainError {
    DomainError::TransportTimeout {
        server: server.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_map_to_transport_kinds() {
        let server: SocketAddr = "10.0.0.1:53".parse().unwrap();
        let refused = map_io_error(server, io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(refused.kind(), "refused");
        let reset = map_io_error(server, io::Error::from(io::ErrorKind::UnexpectedEof));
        assert_eq!(reset.kind(), "reset");
        let other = map_io_error(server, io::Error::other("boom"));
        assert_eq!(other.kind(), "transport");
        assert!(other.is_retryable());
    }
}
