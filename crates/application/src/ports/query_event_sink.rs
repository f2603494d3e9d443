use ferrous_forwarder_domain::QueryEvent;

/// Consumer of resolution events (aggregated counters, exporters).
pub trait QueryEventSink: Send + Sync {
    fn record(&self, event: &QueryEvent);
}
