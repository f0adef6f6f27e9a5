//! Entry point for the surrounding application: index notes, build grounded context.

use std::sync::Arc;
use std::time::Duration;

use notemind_llm::EmbeddingProvider;
use notemind_memory::document::{IngestionPipeline, Note, StoredChunk, TextSplitter};
use notemind_memory::{CacheService, NoteRetriever, VectorStore, question_cache_key};

use crate::config::{Config, TimeoutConfig};
use crate::error::AssistantError;
use crate::rate_limit::RateLimiter;

pub struct NoteAssistant<P: EmbeddingProvider + Clone> {
    pipeline: IngestionPipeline<P>,
    retriever: NoteRetriever<P>,
    cache: Arc<dyn CacheService>,
    limiter: RateLimiter,
    timeouts: TimeoutConfig,
}

impl<P: EmbeddingProvider + Clone> NoteAssistant<P> {
    /// Wire the pipeline, retriever and limiter from `config` around shared backends.
    pub fn new(
        config: &Config,
        provider: P,
        store: Arc<dyn VectorStore>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        let collection = config.storage.collection.as_str();
        let pipeline = IngestionPipeline::new(
            TextSplitter::new(config.chunking),
            Arc::clone(&store),
            collection,
            provider.clone(),
        )
        .with_batch_size(config.embedding.batch_size);
        let retriever = NoteRetriever::new(store, collection, provider, config.retrieval.clone());
        let limiter = RateLimiter::new(
            config.rate_limit.requests_per_window,
            Duration::from_secs(config.rate_limit.window_secs),
        );
        tracing::debug!(
            collection = pipeline.collection(),
            top_k = retriever.config().top_k,
            score_threshold = retriever.config().score_threshold,
            "note assistant ready"
        );

        Self {
            pipeline,
            retriever,
            cache,
            limiter,
            timeouts: config.timeouts,
        }
    }

    /// # Errors
    ///
    /// Returns an error if embedding or vector storage fails.
    pub async fn ingest_note(&self, note: &Note) -> Result<Vec<StoredChunk>, AssistantError> {
        Ok(self.pipeline.ingest(note).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the vector store rejects the deletion.
    pub async fn remove_note(&self, chunks: &[StoredChunk]) -> Result<(), AssistantError> {
        Ok(self.pipeline.remove(chunks).await?)
    }

    /// Grounding context for `user_id`'s latest messages.
    ///
    /// Served from the cache when the same question was answered within the
    /// cache TTL.
    ///
    /// # Errors
    ///
    /// Returns `RateLimited` when the user is over quota, `Timeout` when
    /// retrieval exceeds the configured limit, or the underlying retrieval error.
    pub async fn context_for(
        &self,
        user_id: &str,
        recent_messages: &[String],
    ) -> Result<String, AssistantError> {
        if !self.limiter.check(user_id).await {
            return Err(AssistantError::RateLimited(user_id.to_owned()));
        }

        let key = question_cache_key(user_id, &self.retriever.query_text(recent_messages));
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(user_id, "context served from cache");
            return Ok(hit);
        }

        let secs = self.timeouts.retrieval_secs;
        let context = tokio::time::timeout(
            Duration::from_secs(secs),
            self.retriever.build_context(user_id, recent_messages),
        )
        .await
        .map_err(|_| AssistantError::Timeout(secs))??;

        self.cache.put(&key, context.clone());
        Ok(context)
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<dyn CacheService> {
        &self.cache
    }
}
