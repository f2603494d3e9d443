use super::exchange::{ExchangeResponse, UpstreamExchange};
use super::failover::FailoverState;
use crate::dns::events::{QueryEvent, QueryEventEmitter};
use crate::dns::transport::timeout_error;
use ferrous_forwarder_domain::{
    DnsProtocol, DomainError, Message, Question, ResponseCode, UpstreamConfig,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Verified upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamAnswer {
    pub message: Message,
    pub server: SocketAddr,
    pub protocol: &'static str,
    pub response_time_us: u64,
}

/// Forwards queries to the configured upstreams with strict-priority failover.
pub struct UpstreamClient {
    servers: Arc<[DnsProtocol]>,
    exchange: Arc<dyn UpstreamExchange>,
    attempt_timeout: Duration,
    query_deadline: Duration,
    attempt_budget: usize,
    emitter: QueryEventEmitter,
}

impl UpstreamClient {
    pub fn new(servers: Vec<DnsProtocol>, exchange: Arc<dyn UpstreamExchange>) -> Self {
        let defaults = UpstreamConfig::default();
        let attempt_budget = servers.len();
        Self {
            servers: servers.into(),
            exchange,
            attempt_timeout: Duration::from_millis(defaults.attempt_timeout_ms),
            query_deadline: Duration::from_millis(defaults.query_deadline_ms),
            attempt_budget,
            emitter: QueryEventEmitter::new_disabled(),
        }
    }

    pub fn from_config(
        config: &UpstreamConfig,
        exchange: Arc<dyn UpstreamExchange>,
    ) -> Result<Self, DomainError> {
        let servers = config
            .parsed_servers()
            .map_err(|e| DomainError::ConfigError(e.to_string()))?;
        Ok(Self::new(servers, exchange)
            .with_attempt_timeout(Duration::from_millis(config.attempt_timeout_ms))
            .with_query_deadline(Duration::from_millis(config.query_deadline_ms))
            .with_attempt_budget(config.effective_attempt_budget()))
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_query_deadline(mut self, deadline: Duration) -> Self {
        self.query_deadline = deadline;
        self
    }

    pub fn with_attempt_budget(mut self, budget: usize) -> Self {
        self.attempt_budget = budget;
        self
    }

    pub fn with_emitter(mut self, emitter: QueryEventEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn servers(&self) -> &[DnsProtocol] {
        &self.servers
    }

    pub fn query_deadline(&self) -> Duration {
        self.query_deadline
    }

    /// Sends `query` to upstreams in priority order until one returns a
    /// matching, usable answer or the attempt budget or deadline runs out.
    pub async fn query(&self, query: &Message) -> Result<UpstreamAnswer, DomainError> {
        let question = query
            .first_question()
            .ok_or_else(|| DomainError::FormatError("upstream query has no question".into()))?;

        let mut state = FailoverState::new(
            self.servers.len(),
            self.attempt_budget,
            Instant::now() + self.query_deadline,
        );

        loop {
            let attempt = match state.next_attempt(self.attempt_timeout, Instant::now()) {
                Ok(attempt) => attempt,
                Err(e) => {
                    warn!(
                        question = %question,
                        attempts = state.attempts_made(),
                        error = %e,
                        "Upstream resolution failed"
                    );
                    return Err(e);
                }
            };

            let server = self.servers[attempt.index];
            let addr = server.socket_addr();
            let start = Instant::now();

            let result = tokio::time::timeout(
                attempt.timeout,
                self.exchange.exchange(&server, query, attempt.timeout),
            )
            .await
            .unwrap_or_else(|_| Err(timeout_error(addr)))
            .and_then(|response| verify_response(query, question, response, addr));

            match result {
                Ok(response) => {
                    let response_time_us = start.elapsed().as_micros() as u64;
                    self.emitter.emit_with(|| QueryEvent::UpstreamAnswer {
                        domain: Arc::from(question.name.to_string()),
                        record_type: question.record_type,
                        server: addr,
                        protocol: response.protocol_used,
                        response_code: response.message.response_code(),
                        response_time_us,
                    });
                    debug!(
                        server = %addr,
                        protocol = response.protocol_used,
                        position = attempt.index,
                        response_time_us,
                        rcode = %response.message.response_code(),
                        "Server responded"
                    );
                    return Ok(UpstreamAnswer {
                        message: response.message,
                        server: addr,
                        protocol: response.protocol_used,
                        response_time_us,
                    });
                }
                Err(e) => {
                    self.emitter.emit_with(|| QueryEvent::UpstreamFailure {
                        domain: Arc::from(question.name.to_string()),
                        record_type: question.record_type,
                        server: addr,
                        error_kind: e.kind(),
                    });
                    warn!(
                        server = %server,
                        position = attempt.index,
                        error = %e,
                        "Failing over"
                    );
                    if !e.is_retryable() {
                        return Err(e);
                    }
                }
            }
        }
    }
}

/// Accepts a reply only if it answers exactly what was asked and carries a
/// usable response code.
fn verify_response(
    query: &Message,
    question: &Question,
    response: ExchangeResponse,
    server: SocketAddr,
) -> Result<ExchangeResponse, DomainError> {
    let mismatch = |reason: &str| DomainError::ResponseMismatch {
        server: server.to_string(),
        reason: reason.to_string(),
    };

    let message = &response.message;
    if message.id() != query.id() {
        return Err(mismatch("transaction id differs from query"));
    }
    if !message.header.response {
        return Err(mismatch("QR bit not set"));
    }
    if message.questions.len() != 1 || !message.questions[0].matches(question) {
        return Err(mismatch("question section does not echo the query"));
    }

    match message.response_code() {
        ResponseCode::ServFail | ResponseCode::Refused => Err(DomainError::UpstreamRcode {
            server: server.to_string(),
            rcode: message.response_code().to_string(),
        }),
        _ => Ok(response),
    }
}
