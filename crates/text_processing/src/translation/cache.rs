//! Bounded translation cache
//!
//! Keys are the exact `(text, direction)` pair; there is no normalization.
//! Entries never expire on their own. They leave the cache through the eviction
//! policy or a wholesale [`TranslationCache::clear`].

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use parsbot_core::TranslationDirection;
use serde::Serialize;

/// Cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub direction: TranslationDirection,
}

impl CacheKey {
    pub fn new(text: impl Into<String>, direction: TranslationDirection) -> Self {
        Self {
            text: text.into(),
            direction,
        }
    }
}

/// Storage and eviction strategy behind a [`TranslationCache`]
pub trait CachePolicy: Send + 'static {
    /// Look up a key, updating recency as the policy defines it
    fn get(&mut self, key: &CacheKey) -> Option<String>;

    /// Store a value. Returns the key evicted to make room, if any.
    fn put(&mut self, key: CacheKey, value: String) -> Option<CacheKey>;

    /// Membership test without touching recency
    fn contains(&self, key: &CacheKey) -> bool;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;
}

/// Least-recently-used eviction
pub struct LruPolicy {
    entries: LruCache<CacheKey, String>,
}

impl LruPolicy {
    /// A zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }
}

impl CachePolicy for LruPolicy {
    fn get(&mut self, key: &CacheKey) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: CacheKey, value: String) -> Option<CacheKey> {
        let inserted = key.clone();
        match self.entries.push(key, value) {
            Some((old, _)) if old != inserted => Some(old),
            _ => None,
        }
    }

    fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub clears: u64,
    pub size: usize,
    pub capacity: usize,
}

/// Memoizes `(text, direction) → translation`
pub struct TranslationCache {
    policy: Mutex<Box<dyn CachePolicy>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    clears: AtomicU64,
}

impl TranslationCache {
    /// LRU cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(Box::new(LruPolicy::new(capacity)))
    }

    pub fn with_policy(policy: Box<dyn CachePolicy>) -> Self {
        Self {
            policy: Mutex::new(policy),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            clears: AtomicU64::new(0),
        }
    }

    pub fn get(&self, text: &str, direction: TranslationDirection) -> Option<String> {
        let found = self.policy.lock().get(&CacheKey::new(text, direction));
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, text: impl Into<String>, direction: TranslationDirection, translation: String) {
        let evicted = self
            .policy
            .lock()
            .put(CacheKey::new(text, direction), translation);
        if let Some(key) = evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(direction = %key.direction, "Evicted translation");
        }
    }

    pub fn contains(&self, text: &str, direction: TranslationDirection) -> bool {
        self.policy.lock().contains(&CacheKey::new(text, direction))
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut policy = self.policy.lock();
        let dropped = policy.len();
        policy.clear();
        drop(policy);

        self.clears.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(dropped, "Translation cache cleared");
    }

    pub fn len(&self) -> usize {
        self.policy.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.policy.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.policy.lock().capacity()
    }

    pub fn stats(&self) -> CacheStats {
        let policy = self.policy.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            size: policy.len(),
            capacity: policy.capacity(),
        }
    }
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("stats", &self.stats())
            .finish()
    }
}
