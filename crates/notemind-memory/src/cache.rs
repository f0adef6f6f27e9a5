//! TTL cache for rendered contexts, injected where per-user caching is needed.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Key/value cache with time-based expiry.
///
/// Implementations must be shareable across tasks; a distributed backend can
/// replace [`InMemoryCache`] without touching call sites.
pub trait CacheService: Send + Sync {
    /// Value for `key` if present and not expired.
    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, value: String);

    fn remove(&self, key: &str);

    /// Drop expired entries. Returns how many were removed.
    fn evict_expired(&self) -> usize;

    /// Number of stored entries, expired ones included until swept.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    inserted_at: Instant,
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    last_sweep: Instant,
}

/// Process-local [`CacheService`].
///
/// Expired entries are swept on `put` at most once per TTL, so the map only
/// holds what was inserted within roughly the last two TTL periods.
#[derive(Debug)]
pub struct InMemoryCache {
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) < self.ttl
    }

    fn sweep(&self, state: &mut CacheState, now: Instant) -> usize {
        let before = state.entries.len();
        state.entries.retain(|_, e| self.is_fresh(e, now));
        state.last_sweep = now;
        let evicted = before - state.entries.len();
        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = state.entries.len(),
                "evicted expired cache entries"
            );
        }
        evicted
    }
}

// Poisoned locks are recovered: entries are plain values with no invariants.
impl CacheService for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state
            .entries
            .get(key)
            .filter(|e| self.is_fresh(e, Instant::now()))
            .map(|e| e.value.clone())
    }

    fn put(&self, key: &str, value: String) {
        let now = Instant::now();
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if now.duration_since(state.last_sweep) >= self.ttl {
            self.sweep(&mut state, now);
        }
        state.entries.insert(
            key.to_owned(),
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    fn remove(&self, key: &str) {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entries
            .remove(key);
    }

    fn evict_expired(&self) -> usize {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.sweep(&mut state, Instant::now())
    }

    fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entries
            .len()
    }
}

/// Cache key for a user's question. Case and surrounding whitespace are ignored.
#[must_use]
pub fn question_cache_key(user_id: &str, question: &str) -> String {
    let normalized = question.trim().to_lowercase();
    let mut hasher = blake3::Hasher::new();
    hasher.update(user_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(normalized.as_bytes());
    format!("{user_id}:{}", hasher.finalize().to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let cache = InMemoryCache::new(Duration::from_secs(60));
        assert!(cache.is_empty());
        cache.put("k", "v".into());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_overwrites() {
        let cache = InMemoryCache::new(Duration::from_secs(60));
        cache.put("k", "old".into());
        cache.put("k", "new".into());
        assert_eq!(cache.get("k").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_deletes_entry() {
        let cache = InMemoryCache::new(Duration::from_secs(60));
        cache.put("k", "v".into());
        cache.remove("k");
        assert_eq!(cache.get("k"), None);
        cache.remove("missing");
    }

    #[test]
    fn expired_entries_are_invisible_until_evicted() {
        let cache = InMemoryCache::new(Duration::ZERO);
        cache.put("k", "v".into());
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.evict_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = InMemoryCache::new(Duration::from_millis(30));
        cache.put("k", "v".into());
        assert!(cache.get("k").is_some());
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn put_sweeps_entries_older_than_ttl() {
        let cache = InMemoryCache::new(Duration::from_millis(5));
        assert_eq!(cache.ttl(), Duration::from_millis(5));
        for i in 0..500 {
            cache.put(&format!("q{i}"), "ctx".into());
        }
        std::thread::sleep(Duration::from_millis(20));
        cache.put("latest", "ctx".into());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("latest").as_deref(), Some("ctx"));
    }

    #[test]
    fn put_does_not_sweep_within_ttl() {
        let cache = InMemoryCache::new(Duration::from_secs(60));
        for i in 0..50 {
            cache.put(&format!("q{i}"), "ctx".into());
        }
        assert_eq!(cache.len(), 50);
    }

    #[test]
    fn eviction_keeps_fresh_entries() {
        let cache = InMemoryCache::new(Duration::from_secs(60));
        cache.put("a", "1".into());
        assert_eq!(cache.evict_expired(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn question_key_ignores_case_and_padding() {
        assert_eq!(
            question_cache_key("alice", "  What is on my list? "),
            question_cache_key("alice", "what is on my list?")
        );
    }

    #[test]
    fn question_key_is_scoped_to_user() {
        let a = question_cache_key("alice", "todo");
        let b = question_cache_key("bob", "todo");
        assert_ne!(a, b);
        assert!(a.starts_with("alice:"));
        assert_eq!(a.len(), "alice:".len() + 64);
    }
}
