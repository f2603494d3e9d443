use super::DnsServerHandler;
use bytes::Bytes;
use ferrous_forwarder_domain::client_context::TCP_MAX_MESSAGE;
use ferrous_forwarder_domain::{ClientContext, ServerConfig};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct TcpListenerOptions {
    pub idle_timeout: Duration,
    /// Queries from one connection resolved concurrently before reads pause.
    pub max_pipelined: usize,
}

impl TcpListenerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            idle_timeout: Duration::from_secs(config.tcp_idle_timeout_secs),
            max_pipelined: config.tcp_max_pipelined.max(1),
        }
    }
}

fn dns_frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(2)
        .max_frame_length(TCP_MAX_MESSAGE)
        .new_codec()
}

pub async fn run_tcp_listener(
    listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    options: TcpListenerOptions,
    shutdown: CancellationToken,
) {
    let local = listener.local_addr().ok();

    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                let _ = stream.set_nodelay(true);
                tokio::spawn(serve_tcp_connection(
                    stream,
                    peer,
                    Arc::clone(&handler),
                    options,
                    shutdown.child_token(),
                ));
            }
            Err(e) => {
                warn!(local = ?local, error = %e, "TCP accept failed");
            }
        }
    }

    info!(local = ?local, "TCP listener stopped");
}

/// Serves one connection of length-prefixed, pipelined queries.
///
/// Responses are written in completion order. The connection closes on a
/// framing or decode error, after `idle_timeout` with nothing in flight, or
/// once the peer half-closes and every outstanding query has been answered.
/// Dropping the in-flight set abandons only this connection's waiters.
pub async fn serve_tcp_connection<S>(
    stream: S,
    peer: SocketAddr,
    handler: Arc<DnsServerHandler>,
    options: TcpListenerOptions,
    shutdown: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut frames = FramedRead::new(reader, dns_frame_codec());
    let mut responses = FramedWrite::new(writer, dns_frame_codec());
    let mut in_flight: JoinSet<Option<Vec<u8>>> = JoinSet::new();
    let mut reading = true;
    let mut answered = 0usize;

    let idle = tokio::time::sleep(options.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            _ = &mut idle, if in_flight.is_empty() => {
                debug!(peer = %peer, answered, "TCP connection idle, closing");
                break;
            }

            frame = frames.next(), if reading && in_flight.len() < options.max_pipelined => {
                match frame {
                    Some(Ok(frame)) => {
                        idle.as_mut().reset(Instant::now() + options.idle_timeout);
                        let Ok(request) = handler.decode_frame(&frame, peer) else {
                            break;
                        };
                        let handler = Arc::clone(&handler);
                        in_flight.spawn(async move {
                            handler.respond(request, ClientContext::tcp(peer)).await
                        });
                    }
                    Some(Err(e)) => {
                        debug!(peer = %peer, error = %e, "TCP framing error, closing");
                        break;
                    }
                    None => reading = false,
                }
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                idle.as_mut().reset(Instant::now() + options.idle_timeout);
                if let Ok(Some(response)) = joined {
                    if let Err(e) = responses.send(Bytes::from(response)).await {
                        debug!(peer = %peer, error = %e, "TCP write failed, closing");
                        break;
                    }
                    answered += 1;
                }
            }
        }

        if !reading && in_flight.is_empty() {
            break;
        }
    }

    in_flight.abort_all();
}
