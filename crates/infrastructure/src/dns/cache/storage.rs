use super::key::CacheKey;
use super::ttl_policy::TtlPolicy;
use super::CacheMetrics;
use ferrous_forwarder_application::ports::{CacheMetricsSnapshot, DnsCachePort};
use ferrous_forwarder_domain::{CacheConfig, Message, Question, ResourceRecord, ResponseCode};
use lru::LruCache;
use rustc_hash::FxBuildHasher;
use std::hash::BuildHasher;
use std::num::NonZeroUsize;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

type ShardMap = LruCache<CacheKey, Arc<CacheEntry>, FxBuildHasher>;
type Shard = Mutex<ShardMap>;

struct CacheEntry {
    response_code: ResponseCode,
    answers: Vec<ResourceRecord>,
    authority: Vec<ResourceRecord>,
    additional: Vec<ResourceRecord>,
    expires_at: u64,
    negative: bool,
}

/// Answer served from the cache, with every TTL rewritten to the seconds left.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAnswer {
    pub response_code: ResponseCode,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
    pub remaining_ttl: u32,
    pub negative: bool,
}

/// Sharded LRU answer cache. Each shard is an independent `LruCache` behind
/// its own mutex, sized `max_entries / shards` (rounded up).
pub struct DnsCache {
    shards: Box<[Shard]>,
    hasher: FxBuildHasher,
    policy: TtlPolicy,
    enabled: bool,
    metrics: Arc<CacheMetrics>,
}

impl DnsCache {
    pub fn new(config: &CacheConfig) -> Self {
        let shard_amount = config.shard_amount.max(1);
        let per_shard = config.max_entries.div_ceil(shard_amount).max(1);
        let capacity = NonZeroUsize::new(per_shard).unwrap_or(NonZeroUsize::MIN);

        let shards = (0..shard_amount)
            .map(|_| Mutex::new(LruCache::with_hasher(capacity, FxBuildHasher)))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        info!(
            enabled = config.enabled,
            max_entries = config.max_entries,
            shards = shard_amount,
            per_shard,
            min_ttl = config.min_ttl,
            max_ttl = config.max_ttl,
            negative_ttl = config.negative_ttl,
            "DNS cache initialized"
        );

        Self {
            shards,
            hasher: FxBuildHasher,
            policy: TtlPolicy::from_config(config),
            enabled: config.enabled,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    fn shard(&self, key: &CacheKey) -> MutexGuard<'_, ShardMap> {
        let index = (self.hasher.hash_one(key) as usize) % self.shards.len();
        self.shards[index]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn lookup(&self, question: &Question, now: u64) -> Option<CachedAnswer> {
        self.read(question, now, true)
    }

    /// Like `lookup`, but leaves the hit and miss counters alone.
    pub fn peek(&self, question: &Question, now: u64) -> Option<CachedAnswer> {
        self.read(question, now, false)
    }

    fn read(&self, question: &Question, now: u64, counted: bool) -> Option<CachedAnswer> {
        if !self.enabled {
            return None;
        }
        let key = CacheKey::from_question(question);

        let entry = {
            let mut shard = self.shard(&key);
            let cached = shard.get(&key).map(Arc::clone);
            match cached {
                Some(entry) if now < entry.expires_at => Some(entry),
                Some(_) => {
                    shard.pop(&key);
                    self.metrics.expirations.fetch_add(1, AtomicOrdering::Relaxed);
                    None
                }
                None => None,
            }
        };

        let Some(entry) = entry else {
            if counted {
                self.metrics.misses.fetch_add(1, AtomicOrdering::Relaxed);
            }
            return None;
        };

        if counted {
            self.metrics.hits.fetch_add(1, AtomicOrdering::Relaxed);
            if entry.negative {
                self.metrics
                    .negative_hits
                    .fetch_add(1, AtomicOrdering::Relaxed);
            }
        }

        let remaining_ttl = (entry.expires_at - now).min(u64::from(u32::MAX)) as u32;
        let rewrite = |records: &[ResourceRecord]| -> Vec<ResourceRecord> {
            records.iter().map(|r| r.with_ttl(remaining_ttl)).collect()
        };

        Some(CachedAnswer {
            response_code: entry.response_code,
            answers: rewrite(&entry.answers),
            authority: rewrite(&entry.authority),
            additional: rewrite(&entry.additional),
            remaining_ttl,
            negative: entry.negative,
        })
    }

    /// Stores `response` under `question`. Only NOERROR and NXDOMAIN answers
    /// are cached; returns whether an entry was written.
    pub fn store(&self, question: &Question, response: &Message, now: u64) -> bool {
        if !self.enabled {
            return false;
        }
        if !matches!(
            response.response_code(),
            ResponseCode::NoError | ResponseCode::NXDomain
        ) {
            return false;
        }

        let negative = response.is_negative();
        let ttl = if negative {
            self.policy.negative(response.soa_negative_ttl())
        } else {
            match response.min_ttl() {
                Some(min) => self.policy.positive(min),
                None => return false,
            }
        };

        let entry = Arc::new(CacheEntry {
            response_code: response.response_code(),
            answers: response.answers.clone(),
            authority: response.authority.clone(),
            additional: response
                .additional
                .iter()
                .filter(|r| !r.is_opt())
                .cloned()
                .collect(),
            expires_at: now + u64::from(ttl),
            negative,
        });

        let key = CacheKey::from_question(question);
        debug!(
            name = %key.name,
            record_type = %key.record_type,
            ttl,
            negative,
            "Cache store"
        );

        let displaced = self.shard(&key).push(key.clone(), entry);
        self.metrics.insertions.fetch_add(1, AtomicOrdering::Relaxed);
        if let Some((old_key, _)) = displaced {
            if old_key != key {
                self.metrics.evictions.fetch_add(1, AtomicOrdering::Relaxed);
            }
        }
        true
    }

    /// Removes every entry expired at `now`; returns how many were removed.
    pub fn sweep(&self, now: u64) -> usize {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut shard = shard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let expired: Vec<CacheKey> = shard
                .iter()
                .filter(|(_, entry)| now >= entry.expires_at)
                .map(|(key, _)| key.clone())
                .collect();
            for key in &expired {
                shard.pop(key);
            }
            removed += expired.len();
        }
        self.metrics
            .expirations
            .fetch_add(removed as u64, AtomicOrdering::Relaxed);
        removed
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .len()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.metrics
    }
}

impl DnsCachePort for DnsCache {
    fn cache_size(&self) -> usize {
        self.len()
    }

    fn cache_metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot(self.len())
    }
}
