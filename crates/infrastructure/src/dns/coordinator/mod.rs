//! In-flight query coordination.
//!
//! A cache miss registers a pending entry keyed by the normalized question and
//! spawns one upstream exchange for it. Concurrent identical queries subscribe to
//! the same `watch` channel instead of starting their own exchange. When the
//! exchange finishes, the answer is cached and every waiter builds its own reply
//! with its own transaction ID, question spelling and RD flag.

mod pending;
mod response;

pub use response::{answer_response, error_response, reject_reason};

use crate::dns::cache::{CacheKey, Clock, DnsCache};
use crate::dns::events::{QueryEvent, QueryEventEmitter};
use crate::dns::upstream::UpstreamClient;
use async_trait::async_trait;
use ferrous_forwarder_application::ports::DnsResolver;
use ferrous_forwarder_domain::{ClientContext, Message, Question, ResponseCode};
use pending::{register, wait_for_outcome, Outcome, PendingGuard, PendingMap, Registration};
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_EDNS_PAYLOAD: u16 = 1232;

pub struct QueryCoordinator {
    cache: Arc<DnsCache>,
    upstream: Arc<UpstreamClient>,
    clock: Arc<dyn Clock>,
    pending: Arc<PendingMap>,
    emitter: QueryEventEmitter,
    edns_payload_size: u16,
}

impl QueryCoordinator {
    pub fn new(cache: Arc<DnsCache>, upstream: Arc<UpstreamClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            upstream,
            clock,
            pending: Arc::new(PendingMap::with_hasher(FxBuildHasher)),
            emitter: QueryEventEmitter::new_disabled(),
            edns_payload_size: DEFAULT_EDNS_PAYLOAD,
        }
    }

    pub fn with_emitter(mut self, emitter: QueryEventEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_edns_payload_size(mut self, size: u16) -> Self {
        self.edns_payload_size = size;
        self
    }

    /// Number of questions with an upstream exchange in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn domain_of(question: &Question) -> Arc<str> {
        Arc::from(question.name.to_string())
    }

    fn spawn_exchange(&self, guard: PendingGuard, question: Question, upstream_id: u16) {
        let cache = Arc::clone(&self.cache);
        let upstream = Arc::clone(&self.upstream);
        let clock = Arc::clone(&self.clock);
        let emitter = self.emitter.clone();
        let edns_payload_size = self.edns_payload_size;

        tokio::spawn(async move {
            let mut query = Message::query(upstream_id, question.clone());
            query.set_opt(edns_payload_size);

            let outcome = match upstream.query(&query).await {
                Ok(answer) => {
                    cache.store(&question, &answer.message, clock.now_secs());
                    Outcome::Answered(Arc::new(answer.message))
                }
                Err(e) => {
                    emitter.emit_with(|| QueryEvent::ResolutionFailed {
                        domain: Self::domain_of(&question),
                        record_type: question.record_type,
                        error_kind: e.kind(),
                    });
                    Outcome::Failed {
                        error_kind: e.kind(),
                    }
                }
            };
            guard.complete(outcome);
        });
    }

    fn reply_from_outcome(&self, request: &Message, outcome: Option<Arc<Outcome>>) -> Message {
        match outcome.as_deref() {
            Some(Outcome::Answered(upstream)) => answer_response(
                request,
                upstream.response_code(),
                upstream.answers.clone(),
                upstream.authority.clone(),
                upstream.additional.clone(),
                self.edns_payload_size,
            ),
            Some(Outcome::Cached(hit)) => answer_response(
                request,
                hit.response_code,
                hit.answers.clone(),
                hit.authority.clone(),
                hit.additional.clone(),
                self.edns_payload_size,
            ),
            Some(Outcome::Failed { error_kind }) => {
                debug!(id = request.id(), error_kind, "Answering SERVFAIL");
                error_response(request, ResponseCode::ServFail)
            }
            None => error_response(request, ResponseCode::ServFail),
        }
    }
}

#[async_trait]
impl DnsResolver for QueryCoordinator {
    async fn resolve(&self, request: &Message, _client: &ClientContext) -> Message {
        if let Some(rcode) = reject_reason(request) {
            debug!(id = request.id(), rcode = %rcode, "Rejecting request");
            return error_response(request, rcode);
        }
        let Some(question) = request.first_question() else {
            return error_response(request, ResponseCode::FormErr);
        };

        if let Some(hit) = self.cache.lookup(question, self.clock.now_secs()) {
            self.emitter.emit_with(|| QueryEvent::CacheHit {
                domain: Self::domain_of(question),
                record_type: question.record_type,
                negative: hit.negative,
            });
            debug!(question = %question, remaining_ttl = hit.remaining_ttl, "Cache HIT");
            return answer_response(
                request,
                hit.response_code,
                hit.answers,
                hit.authority,
                hit.additional,
                self.edns_payload_size,
            );
        }

        self.emitter.emit_with(|| QueryEvent::CacheMiss {
            domain: Self::domain_of(question),
            record_type: question.record_type,
        });

        let key = CacheKey::from_question(question);
        let receiver = match register(
            &self.pending,
            &key,
            question,
            request.id(),
            self.upstream.query_deadline(),
        ) {
            Registration::Leader {
                upstream_id,
                receiver,
            } => {
                // A previous exchange may have stored its answer and left the
                // pending map between the first lookup and registration.
                let guard = PendingGuard::new(Arc::clone(&self.pending), key);
                match self.cache.peek(question, self.clock.now_secs()) {
                    Some(hit) => {
                        debug!(question = %question, "Cache filled during registration");
                        guard.complete(Outcome::Cached(hit));
                    }
                    None => {
                        debug!(question = %question, upstream_id, "Cache MISS, forwarding");
                        self.spawn_exchange(guard, question.clone(), upstream_id);
                    }
                }
                receiver
            }
            Registration::Follower {
                upstream_id,
                waiters,
                age_ms,
                receiver,
            } => {
                self.emitter.emit_with(|| QueryEvent::DedupMerge {
                    domain: Self::domain_of(question),
                    record_type: question.record_type,
                    waiters,
                });
                debug!(
                    question = %question,
                    upstream_id,
                    waiters,
                    age_ms,
                    "Joined in-flight query"
                );
                receiver
            }
        };

        let outcome = wait_for_outcome(receiver).await;
        self.reply_from_outcome(request, outcome)
    }
}
