use ferrous_forwarder_application::ports::QueryEventSink;
use ferrous_forwarder_domain::QueryEvent;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drains the resolver's event channel into `tracing` and an aggregating sink.
pub struct QueryEventLoggerJob {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<QueryEvent>>>,
    sink: Arc<dyn QueryEventSink>,
    shutdown: CancellationToken,
}

impl QueryEventLoggerJob {
    pub fn new(receiver: mpsc::UnboundedReceiver<QueryEvent>, sink: Arc<dyn QueryEventSink>) -> Self {
        Self {
            receiver: Mutex::new(Some(receiver)),
            sink,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        let receiver = match self.receiver.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(mut receiver) = receiver else {
            warn!("QueryEventLoggerJob already started");
            return;
        };

        info!("Starting query event logger");
        let job = Arc::clone(&self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = job.shutdown.cancelled() => {
                        info!("QueryEventLoggerJob: shutting down");
                        break;
                    }
                    event = receiver.recv() => match event {
                        Some(event) => job.handle(&event),
                        None => {
                            info!("QueryEventLoggerJob: channel closed, shutting down");
                            break;
                        }
                    },
                }
            }
        });
    }

    fn handle(&self, event: &QueryEvent) {
        log_event(event);
        self.sink.record(event);
    }
}

fn log_event(event: &QueryEvent) {
    match event {
        QueryEvent::UpstreamFailure {
            domain,
            record_type,
            server,
            error_kind,
        } => warn!(
            domain = %domain,
            record_type = %record_type,
            server = %server,
            error_kind,
            "Upstream attempt failed"
        ),
        QueryEvent::ResolutionFailed {
            domain,
            record_type,
            error_kind,
        } => warn!(
            domain = %domain,
            record_type = %record_type,
            error_kind,
            "Resolution failed, answering SERVFAIL"
        ),
        QueryEvent::UpstreamAnswer {
            domain,
            record_type,
            server,
            protocol,
            response_code,
            response_time_us,
        } => debug!(
            domain = %domain,
            record_type = %record_type,
            server = %server,
            protocol,
            rcode = %response_code,
            response_time_us,
            "Upstream answered"
        ),
        other => debug!(kind = other.kind(), domain = other.domain(), "Query event"),
    }
}
