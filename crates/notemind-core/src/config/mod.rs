mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Used when neither `--config` nor `NOTEMIND_CONFIG` names a file.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Pick the config file: explicit path, then `NOTEMIND_CONFIG`, then the default.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("NOTEMIND_CONFIG")
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the resulting values fail [`Config::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first out-of-range value.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunking.max_chunk_size == 0 {
            bail!("chunking.max_chunk_size must be at least 1");
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if !(-1.0..=1.0).contains(&self.retrieval.score_threshold) {
            bail!(
                "retrieval.score_threshold must be within [-1, 1], got {}",
                self.retrieval.score_threshold
            );
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be at least 1");
        }
        if self.storage.collection.trim().is_empty() {
            bail!("storage.collection must not be empty");
        }
        if self.rate_limit.requests_per_window > 0 && self.rate_limit.window_secs == 0 {
            bail!("rate_limit.window_secs must be at least 1 when limiting is enabled");
        }
        if self.timeouts.retrieval_secs == 0 || self.timeouts.embedding_secs == 0 {
            bail!("timeouts must be at least 1 second");
        }
        if self.embedding.provider == EmbeddingProviderKind::OpenAi
            && self.embedding.model.trim().is_empty()
        {
            bail!("embedding.model must be set for the openai provider");
        }
        Ok(())
    }
}
