#![allow(dead_code)]

use async_trait::async_trait;
use ferrous_forwarder_application::ports::{
    CacheMetricsSnapshot, DnsCachePort, DnsResolver, QueryInterceptor,
};
use ferrous_forwarder_domain::{ClientContext, Message, RecordType, ResponseCode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Resolver that answers from a table keyed by lowercase domain.
/// Unknown names come back as NXDOMAIN.
pub struct MockDnsResolver {
    responses: Arc<RwLock<HashMap<String, Vec<ferrous_forwarder_domain::ResourceRecord>>>>,
    seen_requests: Arc<Mutex<Vec<Message>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockDnsResolver {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            seen_requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn set_response(
        &self,
        domain: &str,
        records: Vec<ferrous_forwarder_domain::ResourceRecord>,
    ) {
        self.responses
            .write()
            .await
            .insert(domain.to_lowercase(), records);
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn seen_requests(&self) -> Vec<Message> {
        self.seen_requests.lock().unwrap().clone()
    }
}

impl Default for MockDnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsResolver for MockDnsResolver {
    async fn resolve(&self, request: &Message, _client: &ClientContext) -> Message {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.seen_requests.lock().unwrap().push(request.clone());

        let mut response = request.clone();
        response.header.response = true;
        response.header.recursion_available = true;

        let domain = request
            .first_question()
            .map(|q| q.name.to_lowercase_key().to_string())
            .unwrap_or_default();

        match self.responses.read().await.get(&domain) {
            Some(records) => response.answers = records.clone(),
            None => response.header.response_code = ResponseCode::NXDomain,
        }
        response
    }
}

/// Interceptor that records what it saw and optionally rewrites messages.
pub struct RecordingInterceptor {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    rewrite_type: Option<RecordType>,
}

impl RecordingInterceptor {
    pub fn new(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label,
            log,
            rewrite_type: None,
        }
    }

    pub fn rewriting_type(mut self, record_type: RecordType) -> Self {
        self.rewrite_type = Some(record_type);
        self
    }
}

impl QueryInterceptor for RecordingInterceptor {
    fn intercept(&self, mut message: Message, _client: &ClientContext) -> Message {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.label, message.header.response));
        if let Some(rt) = self.rewrite_type {
            for q in message.questions.iter_mut() {
                q.record_type = rt;
            }
        }
        message
    }
}

pub struct MockDnsCache {
    snapshot: CacheMetricsSnapshot,
}

impl MockDnsCache {
    pub fn new(snapshot: CacheMetricsSnapshot) -> Self {
        Self { snapshot }
    }
}

impl DnsCachePort for MockDnsCache {
    fn cache_size(&self) -> usize {
        self.snapshot.total_entries
    }

    fn cache_metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.snapshot.clone()
    }
}
