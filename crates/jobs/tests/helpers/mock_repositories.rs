#![allow(dead_code)]

use async_trait::async_trait;
use ferrous_forwarder_application::ports::{
    CacheMaintenancePort, CacheSweepOutcome, QueryEventSink,
};
use ferrous_forwarder_domain::{DomainError, QueryEvent, RecordType};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub struct MockCacheMaintenancePort {
    tick_count: AtomicU64,
    sweep_count: AtomicU64,
    should_fail_sweep: AtomicBool,
}

impl MockCacheMaintenancePort {
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            sweep_count: AtomicU64::new(0),
            should_fail_sweep: AtomicBool::new(false),
        }
    }

    pub fn tick_call_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    pub fn sweep_call_count(&self) -> u64 {
        self.sweep_count.load(Ordering::Relaxed)
    }

    pub fn set_should_fail_sweep(&self, fail: bool) {
        self.should_fail_sweep.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl CacheMaintenancePort for MockCacheMaintenancePort {
    fn tick(&self) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
    }

    async fn run_sweep_cycle(&self) -> Result<CacheSweepOutcome, DomainError> {
        self.sweep_count.fetch_add(1, Ordering::Relaxed);
        if self.should_fail_sweep.load(Ordering::Relaxed) {
            return Err(DomainError::IoError("mock sweep failure".to_string()));
        }
        Ok(CacheSweepOutcome {
            entries_removed: 3,
            cache_size: 10,
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    kinds: Mutex<Vec<&'static str>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.kinds.lock().unwrap().clone()
    }
}

impl QueryEventSink for RecordingSink {
    fn record(&self, event: &QueryEvent) {
        self.kinds.lock().unwrap().push(event.kind());
    }
}

pub fn cache_miss(domain: &str) -> QueryEvent {
    QueryEvent::CacheMiss {
        domain: Arc::from(domain),
        record_type: RecordType::A,
    }
}

pub fn resolution_failed(domain: &str) -> QueryEvent {
    QueryEvent::ResolutionFailed {
        domain: Arc::from(domain),
        record_type: RecordType::AAAA,
        error_kind: "timeout",
    }
}
