use async_trait::async_trait;
use ferrous_forwarder_domain::{
    DnsProtocol, DomainError, Message, RData, RecordType, ResourceRecord, ResponseCode, Soa,
};
use ferrous_forwarder_infrastructure::dns::upstream::{ExchangeResponse, UpstreamExchange};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How a scripted upstream reacts to every query it receives.
#[derive(Debug, Clone)]
pub enum Behavior {
    Answer {
        records: Vec<ResourceRecord>,
        delay: Duration,
    },
    NxDomain {
        soa_ttl: u32,
    },
    /// Never replies; the caller's attempt timeout fires.
    Silent,
    Rcode(ResponseCode),
    /// Replies with a transaction ID that does not match the query.
    WrongId,
}

/// In-memory upstreams keyed by address. Unknown addresses are silent.
#[derive(Default)]
pub struct FakeExchange {
    behaviors: Mutex<HashMap<SocketAddr, Behavior>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(SocketAddr, Message)>>,
}

impl FakeExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, server: SocketAddr, behavior: Behavior) -> Self {
        self.set(server, behavior);
        self
    }

    pub fn set(&self, server: SocketAddr, behavior: Behavior) {
        self.behaviors.lock().unwrap().insert(server, behavior);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn servers_contacted(&self) -> Vec<SocketAddr> {
        self.seen.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    pub fn queries_seen(&self) -> Vec<Message> {
        self.seen.lock().unwrap().iter().map(|(_, q)| q.clone()).collect()
    }

    fn reply(query: &Message) -> Message {
        let mut reply = query.clone();
        reply.header.response = true;
        reply.header.recursion_available = true;
        reply.additional.retain(|r| !r.is_opt());
        reply
    }
}

#[async_trait]
impl UpstreamExchange for FakeExchange {
    async fn exchange(
        &self,
        server: &DnsProtocol,
        query: &Message,
        _timeout: Duration,
    ) -> Result<ExchangeResponse, DomainError> {
        let addr = server.socket_addr();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((addr, query.clone()));

        let behavior = self.behaviors.lock().unwrap().get(&addr).cloned();
        let mut reply = Self::reply(query);
        match behavior.unwrap_or(Behavior::Silent) {
            Behavior::Answer { records, delay } => {
                tokio::time::sleep(delay).await;
                reply.answers = records;
            }
            Behavior::NxDomain { soa_ttl } => {
                let zone = query.questions[0].name.clone();
                reply.header.response_code = ResponseCode::NXDomain;
                reply.authority.push(ResourceRecord::new(
                    zone.clone(),
                    RecordType::SOA,
                    soa_ttl,
                    RData::SOA(Soa {
                        mname: zone.clone(),
                        rname: zone,
                        serial: 1,
                        refresh: 3600,
                        retry: 600,
                        expire: 86400,
                        minimum: soa_ttl,
                    }),
                ));
            }
            Behavior::Silent => std::future::pending::<()>().await,
            Behavior::Rcode(rcode) => reply.header.response_code = rcode,
            Behavior::WrongId => reply.header.id = query.header.id.wrapping_add(1),
        }

        Ok(ExchangeResponse {
            message: reply,
            protocol_used: server.protocol_name(),
        })
    }
}
