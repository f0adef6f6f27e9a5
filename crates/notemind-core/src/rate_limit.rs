//! Fixed-window request counting per user.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const MAX_RATE_LIMIT_ENTRIES: usize = 10_000;

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    counters: Mutex<HashMap<String, (u32, Instant)>>,
}

impl RateLimiter {
    /// Allow `limit` requests per user in each `window`. A limit of zero disables the check.
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Record one request from `user_id`; `false` means it is over the limit.
    pub async fn check(&self, user_id: &str) -> bool {
        if self.limit == 0 {
            return true;
        }

        let now = Instant::now();
        let mut counters = self.counters.lock().await;

        if counters.len() >= MAX_RATE_LIMIT_ENTRIES && !counters.contains_key(user_id) {
            counters.retain(|_, (_, ts)| now.duration_since(*ts) < self.window);
        }

        let entry = counters.entry(user_id.to_owned()).or_insert((0, now));
        if now.duration_since(entry.1) >= self.window {
            *entry = (1, now);
            return true;
        }
        entry.0 += 1;
        if entry.0 > self.limit {
            tracing::debug!(user_id, count = entry.0, limit = self.limit, "rate limit exceeded");
            return false;
        }
        true
    }

    /// Users currently tracked.
    pub async fn tracked_users(&self) -> usize {
        self.counters.lock().await.len()
    }
}
