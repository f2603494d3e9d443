use super::DnsServerHandler;
use ferrous_forwarder_domain::client_context::UDP_MAX_PAYLOAD;
use std::io;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Receives datagrams until `shutdown` fires. Each datagram is answered by its
/// own task; the receive loop never waits on resolution.
pub async fn run_udp_listener(
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    shutdown: CancellationToken,
) {
    let local = socket.local_addr().ok();
    let mut recv_buf = vec![0u8; UDP_MAX_PAYLOAD];

    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = socket.recv_from(&mut recv_buf) => received,
        };

        match received {
            Ok((n, peer)) => {
                let datagram = recv_buf[..n].to_vec();
                let handler = Arc::clone(&handler);
                let socket = Arc::clone(&socket);
                tokio::spawn(async move {
                    if let Some(response) = handler.handle_udp(&datagram, peer).await {
                        if let Err(e) = socket.send_to(&response, peer).await {
                            debug!(peer = %peer, error = %e, "UDP send failed");
                        }
                    }
                });
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::ConnectionReset
                ) =>
            {
                continue
            }
            Err(e) => {
                error!(local = ?local, error = %e, "UDP recv error");
            }
        }
    }

    info!(local = ?local, "UDP listener stopped");
}
