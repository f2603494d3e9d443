use crate::dns_message::ResponseCode;
use crate::dns_record::RecordType;
use std::net::SocketAddr;
use std::sync::Arc;

/// Structured events emitted by the resolution engine for external collectors.
#[derive(Debug, Clone)]
pub enum QueryEvent {
    CacheHit {
        domain: Arc<str>,
        record_type: RecordType,
        negative: bool,
    },
    CacheMiss {
        domain: Arc<str>,
        record_type: RecordType,
    },
    /// A client query joined an exchange already in flight.
    DedupMerge {
        domain: Arc<str>,
        record_type: RecordType,
        waiters: usize,
    },
    UpstreamAnswer {
        domain: Arc<str>,
        record_type: RecordType,
        server: SocketAddr,
        protocol: &'static str,
        response_code: ResponseCode,
        response_time_us: u64,
    },
    UpstreamFailure {
        domain: Arc<str>,
        record_type: RecordType,
        server: SocketAddr,
        error_kind: &'static str,
    },
    /// Every attempt failed; waiters were answered with SERVFAIL.
    ResolutionFailed {
        domain: Arc<str>,
        record_type: RecordType,
        error_kind: &'static str,
    },
}

impl QueryEvent {
    pub fn domain(&self) -> &str {
        match self {
            QueryEvent::CacheHit { domain, .. }
            | QueryEvent::CacheMiss { domain, .. }
            | QueryEvent::DedupMerge { domain, .. }
            | QueryEvent::UpstreamAnswer { domain, .. }
            | QueryEvent::UpstreamFailure { domain, .. }
            | QueryEvent::ResolutionFailed { domain, .. } => domain,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QueryEvent::CacheHit { .. } => "cache_hit",
            QueryEvent::CacheMiss { .. } => "cache_miss",
            QueryEvent::DedupMerge { .. } => "dedup_merge",
            QueryEvent::UpstreamAnswer { .. } => "upstream_answer",
            QueryEvent::UpstreamFailure { .. } => "upstream_failure",
            QueryEvent::ResolutionFailed { .. } => "resolution_failed",
        }
    }
}
