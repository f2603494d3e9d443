use crate::dns_protocol::TransportKind;
use std::net::SocketAddr;

/// Classic DNS/UDP response limit without EDNS(0).
pub const UDP_DEFAULT_PAYLOAD: usize = 512;
/// Largest UDP response this forwarder will produce, whatever the client advertises.
pub const UDP_MAX_PAYLOAD: usize = 4096;
pub const TCP_MAX_MESSAGE: usize = 65535;

/// Delivery information for one client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientContext {
    pub transport: TransportKind,
    pub peer: SocketAddr,
    pub max_response_size: usize,
}

impl ClientContext {
    pub fn udp(peer: SocketAddr, edns_payload_size: Option<u16>) -> Self {
        let max_response_size = edns_payload_size
            .map(|size| usize::from(size).clamp(UDP_DEFAULT_PAYLOAD, UDP_MAX_PAYLOAD))
            .unwrap_or(UDP_DEFAULT_PAYLOAD);
        Self {
            transport: TransportKind::Udp,
            peer,
            max_response_size,
        }
    }

    pub fn tcp(peer: SocketAddr) -> Self {
        Self {
            transport: TransportKind::Tcp,
            peer,
            max_response_size: TCP_MAX_MESSAGE,
        }
    }
}
