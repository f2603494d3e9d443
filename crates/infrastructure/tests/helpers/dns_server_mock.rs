use ferrous_forwarder_domain::Message;
use ferrous_forwarder_infrastructure::dns::transport::tcp::{
    read_with_length_prefix, send_with_length_prefix,
};
use ferrous_forwarder_infrastructure::dns::wire::{decode, encode};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

use super::a_record;

#[derive(Default)]
struct Counters {
    udp: AtomicUsize,
    tcp: AtomicUsize,
}

/// Upstream resolver on 127.0.0.1 serving the same port over UDP and TCP.
/// Every A query is answered with 93.184.216.34.
pub struct MockDnsServer {
    addr: SocketAddr,
    counters: Arc<Counters>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(ttl: u32) -> Self {
        Self::start_with(ttl, false, Duration::ZERO).await
    }

    /// Replies over UDP carry only the header, question and TC bit.
    pub async fn start_truncating(ttl: u32) -> Self {
        Self::start_with(ttl, true, Duration::ZERO).await
    }

    /// UDP replies are held back for `delay`.
    pub async fn start_delayed(ttl: u32, delay: Duration) -> Self {
        Self::start_with(ttl, false, delay).await
    }

    async fn start_with(ttl: u32, truncate_udp: bool, delay: Duration) -> Self {
        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = tcp.local_addr().unwrap();
        let udp = Arc::new(UdpSocket::bind(addr).await.unwrap());

        let counters = Arc::new(Counters::default());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let udp_counters = Arc::clone(&counters);
        let tcp_counters = Arc::clone(&counters);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = udp.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        udp_counters.udp.fetch_add(1, Ordering::SeqCst);
                        if let Some(response) = Self::respond(&buf[..len], ttl, truncate_udp) {
                            let udp = Arc::clone(&udp);
                            tokio::spawn(async move {
                                tokio::time::sleep(delay).await;
                                let _ = udp.send_to(&response, peer).await;
                            });
                        }
                    }
                    accepted = tcp.accept() => {
                        let Ok((mut stream, _)) = accepted else { continue };
                        let counters = Arc::clone(&tcp_counters);
                        tokio::spawn(async move {
                            while let Ok(query) = read_with_length_prefix(&mut stream).await {
                                counters.tcp.fetch_add(1, Ordering::SeqCst);
                                let Some(response) = Self::respond(&query, ttl, false) else {
                                    break;
                                };
                                if send_with_length_prefix(&mut stream, &response).await.is_err() {
                                    break;
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            counters,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.counters.udp.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.counters.tcp.load(Ordering::SeqCst)
    }

    fn respond(query: &[u8], ttl: u32, truncate: bool) -> Option<Vec<u8>> {
        let query: Message = decode(query).ok()?;
        let mut reply = query.clone();
        reply.header.response = true;
        reply.header.recursion_available = true;
        if truncate {
            reply.header.truncated = true;
        } else {
            let name = query.questions.first()?.name.to_string();
            reply
                .answers
                .push(a_record(&name, ttl, Ipv4Addr::new(93, 184, 216, 34)));
        }
        encode(&reply, 4096).ok()
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
