use crate::dns::wire::{decode, encode};
use ferrous_forwarder_application::use_cases::HandleDnsQueryUseCase;
use ferrous_forwarder_domain::{ClientContext, DomainError, Message};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bridges raw listener bytes and [`HandleDnsQueryUseCase`].
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self { use_case }
    }

    /// Answers one datagram. Undecodable input yields `None` and nothing is sent.
    pub async fn handle_udp(&self, datagram: &[u8], peer: SocketAddr) -> Option<Vec<u8>> {
        let request = match decode(datagram) {
            Ok(request) => request,
            Err(e) => {
                debug!(peer = %peer, bytes = datagram.len(), error = %e, "Dropping malformed datagram");
                return None;
            }
        };
        let client = ClientContext::udp(peer, request.edns_payload_size());
        self.respond(request, client).await
    }

    /// Decodes a TCP frame. The caller closes the connection on error.
    pub fn decode_frame(&self, frame: &[u8], peer: SocketAddr) -> Result<Message, DomainError> {
        decode(frame).inspect_err(|e| {
            debug!(peer = %peer, bytes = frame.len(), error = %e, "Malformed TCP frame");
        })
    }

    /// Resolves a decoded request and encodes the reply within the client's size limit.
    pub async fn respond(&self, request: Message, client: ClientContext) -> Option<Vec<u8>> {
        let response = self.use_case.execute(request, &client).await;
        match encode(&response, client.max_response_size) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(peer = %client.peer, id = response.id(), error = %e, "Failed to encode response");
                None
            }
        }
    }
}
