use crate::dns::cache::{CacheKey, CachedAnswer};
use dashmap::DashMap;
use ferrous_forwarder_domain::{Message, Question};
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

/// How an upstream exchange ended, shared by every waiter of the question.
#[derive(Debug)]
pub(super) enum Outcome {
    Answered(Arc<Message>),
    /// Another exchange filled the cache before this one was started.
    Cached(CachedAnswer),
    Failed { error_kind: &'static str },
}

pub(super) type OutcomeReceiver = watch::Receiver<Option<Arc<Outcome>>>;
type OutcomeSender = watch::Sender<Option<Arc<Outcome>>>;

/// An outstanding upstream exchange. The clients waiting on it are the live
/// receivers of `sender`; a waiter that goes away drops its receiver.
pub(super) struct PendingQuery {
    pub upstream_id: u16,
    pub question: Question,
    pub created_at: Instant,
    pub deadline: Instant,
    sender: OutcomeSender,
}

impl PendingQuery {
    pub fn waiters(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub(super) type PendingMap = DashMap<CacheKey, PendingQuery, FxBuildHasher>;

pub(super) enum Registration {
    /// First waiter: owns the exchange and must spawn it.
    Leader {
        upstream_id: u16,
        receiver: OutcomeReceiver,
    },
    Follower {
        upstream_id: u16,
        waiters: usize,
        age_ms: u64,
        receiver: OutcomeReceiver,
    },
}

/// Joins the exchange in flight for `key`, or creates one with a fresh
/// upstream transaction ID distinct from the requesting client's.
pub(super) fn register(
    pending: &PendingMap,
    key: &CacheKey,
    question: &Question,
    client_id: u16,
    deadline: Duration,
) -> Registration {
    match pending.entry(key.clone()) {
        dashmap::Entry::Occupied(e) => {
            let entry = e.get();
            let receiver = entry.sender.subscribe();
            Registration::Follower {
                upstream_id: entry.upstream_id,
                waiters: entry.waiters(),
                age_ms: entry.created_at.elapsed().as_millis() as u64,
                receiver,
            }
        }
        dashmap::Entry::Vacant(e) => {
            let (sender, receiver) = watch::channel(None);
            let mut upstream_id = fastrand::u16(..);
            while upstream_id == client_id {
                upstream_id = fastrand::u16(..);
            }
            let created_at = Instant::now();
            e.insert(PendingQuery {
                upstream_id,
                question: question.clone(),
                created_at,
                deadline: created_at + deadline,
                sender,
            });
            Registration::Leader {
                upstream_id,
                receiver,
            }
        }
    }
}

/// Waits for the exchange to finish. `None` means it was abandoned without
/// an outcome (the exchange task was cancelled or panicked).
pub(super) async fn wait_for_outcome(mut receiver: OutcomeReceiver) -> Option<Arc<Outcome>> {
    loop {
        if let Some(outcome) = receiver.borrow_and_update().clone() {
            return Some(outcome);
        }
        if receiver.changed().await.is_err() {
            return receiver.borrow().clone();
        }
    }
}

/// Owned by the exchange task. Removes the pending entry and wakes every
/// waiter exactly once, with `None` if the task ends without completing.
pub(super) struct PendingGuard {
    pending: Arc<PendingMap>,
    key: CacheKey,
    armed: bool,
}

impl PendingGuard {
    pub fn new(pending: Arc<PendingMap>, key: CacheKey) -> Self {
        Self {
            pending,
            key,
            armed: true,
        }
    }

    /// Publishes `outcome`; returns how many clients were still waiting.
    pub fn complete(mut self, outcome: Outcome) -> usize {
        self.armed = false;
        match self.pending.remove(&self.key) {
            Some((_, entry)) => {
                let waiters = entry.waiters();
                debug!(
                    question = %entry.question,
                    upstream_id = entry.upstream_id,
                    waiters,
                    elapsed_ms = entry.created_at.elapsed().as_millis() as u64,
                    past_deadline = Instant::now() > entry.deadline,
                    "Pending query completed"
                );
                let _ = entry.sender.send(Some(Arc::new(outcome)));
                waiters
            }
            None => 0,
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some((_, entry)) = self.pending.remove(&self.key) {
            let _ = entry.sender.send(None);
        }
    }
}
