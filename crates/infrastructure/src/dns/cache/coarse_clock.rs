use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

static COARSE_CLOCK: LazyLock<AtomicU64> = LazyLock::new(|| AtomicU64::new(now_secs()));

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[inline]
pub fn coarse_now_secs() -> u64 {
    COARSE_CLOCK.load(Ordering::Relaxed)
}

/// Refreshes the shared second counter. Called once per second by the
/// cache maintenance job.
pub fn tick() {
    COARSE_CLOCK.store(now_secs(), Ordering::Relaxed);
}

/// Source of "now" in whole seconds for cache expiry decisions.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

/// Reads the process-wide coarse clock; one relaxed atomic load per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoarseClock;

impl Clock for CoarseClock {
    #[inline]
    fn now_secs(&self) -> u64 {
        coarse_now_secs()
    }
}
