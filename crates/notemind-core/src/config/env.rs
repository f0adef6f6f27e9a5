use std::str::FromStr;

use super::Config;
use crate::secret::Secret;

/// Parse `key` from the environment. Unparseable values are logged and ignored.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    if let Ok(v) = raw.trim().parse::<T>() {
        Some(v)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_embedding();
        self.apply_env_overrides_retrieval();
        self.apply_env_overrides_limits();
        self.apply_env_overrides_secrets();
    }

    fn apply_env_overrides_embedding(&mut self) {
        if let Ok(v) = std::env::var("NOTEMIND_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid NOTEMIND_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("NOTEMIND_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("NOTEMIND_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(n) = env_parse("NOTEMIND_EMBEDDING_BATCH_SIZE") {
            self.embedding.batch_size = n;
        }
        if let Some(n) = env_parse("NOTEMIND_EMBEDDING_MAX_RETRIES") {
            self.embedding.max_retries = n;
        }
        if let Some(secs) = env_parse("NOTEMIND_TIMEOUT_EMBEDDING") {
            self.timeouts.embedding_secs = secs;
        }
    }

    fn apply_env_overrides_retrieval(&mut self) {
        if let Some(n) = env_parse("NOTEMIND_CHUNK_SIZE") {
            self.chunking.max_chunk_size = n;
        }
        if let Some(n) = env_parse("NOTEMIND_CHUNK_OVERLAP") {
            self.chunking.overlap_size = n;
        }
        if let Some(n) = env_parse("NOTEMIND_RETRIEVAL_TOP_K") {
            self.retrieval.top_k = n;
        }
        if let Some(t) = env_parse("NOTEMIND_RETRIEVAL_SCORE_THRESHOLD") {
            self.retrieval.score_threshold = t;
        }
        if let Some(n) = env_parse("NOTEMIND_RETRIEVAL_HISTORY_MESSAGES") {
            self.retrieval.history_messages = n;
        }
        if let Some(secs) = env_parse("NOTEMIND_TIMEOUT_RETRIEVAL") {
            self.timeouts.retrieval_secs = secs;
        }
        if let Ok(v) = std::env::var("NOTEMIND_COLLECTION") {
            self.storage.collection = v;
        }
    }

    fn apply_env_overrides_limits(&mut self) {
        if let Some(secs) = env_parse("NOTEMIND_CACHE_TTL_SECS") {
            self.cache.ttl_secs = secs;
        }
        if let Some(n) = env_parse("NOTEMIND_RATE_LIMIT_REQUESTS") {
            self.rate_limit.requests_per_window = n;
        }
        if let Some(secs) = env_parse("NOTEMIND_RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = secs;
        }
    }

    fn apply_env_overrides_secrets(&mut self) {
        if let Ok(v) = std::env::var("NOTEMIND_OPENAI_API_KEY")
            && !v.is_empty()
        {
            self.secrets.openai_api_key = Some(Secret::new(v));
        }
    }
}
