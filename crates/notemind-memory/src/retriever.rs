//! Per-user semantic search over indexed notes.

use std::sync::Arc;

use notemind_llm::EmbeddingProvider;
use serde::{Deserialize, Serialize};

use crate::context::{NO_RELEVANT_NOTES, RetrievedFragment, assemble_context};
use crate::error::MemoryError;
use crate::vector_store::{VectorFilter, VectorStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum hits requested from the vector store.
    pub top_k: usize,
    /// Hits must score strictly above this to be kept.
    pub score_threshold: f32,
    /// How many of the latest messages form the search query.
    pub history_messages: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            score_threshold: 0.4,
            history_messages: 3,
        }
    }
}

pub struct NoteRetriever<P: EmbeddingProvider> {
    store: Arc<dyn VectorStore>,
    collection: String,
    provider: P,
    config: RetrievalConfig,
}

impl<P: EmbeddingProvider> NoteRetriever<P> {
    pub fn new(
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        provider: P,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            provider,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Search query built from the conversation: the last `history_messages`
    /// messages joined by newlines. No title is prepended.
    #[must_use]
    pub fn query_text(&self, recent_messages: &[String]) -> String {
        let skip = recent_messages
            .len()
            .saturating_sub(self.config.history_messages);
        recent_messages[skip..].join("\n")
    }

    /// Fragments of `user_id`'s notes relevant to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or vector search fails.
    pub async fn retrieve(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<RetrievedFragment>, MemoryError> {
        if !self.store.collection_exists(&self.collection).await? {
            tracing::debug!(collection = %self.collection, "no notes indexed yet");
            return Ok(Vec::new());
        }

        let vector = self.provider.embed(query).await?;
        let hits = self
            .store
            .search(
                &self.collection,
                vector,
                self.config.top_k as u64,
                Some(VectorFilter::must_text("userId", user_id)),
            )
            .await?;

        let total = hits.len();
        let fragments: Vec<_> = hits
            .into_iter()
            .filter(|h| h.score > self.config.score_threshold)
            .map(|h| RetrievedFragment::from_payload(&h.payload, h.score))
            .collect();

        tracing::debug!(
            user_id,
            hits = total,
            kept = fragments.len(),
            threshold = self.config.score_threshold,
            "retrieved note fragments"
        );
        Ok(fragments)
    }

    /// Render grounding context for the latest turn of a conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or vector search fails.
    pub async fn build_context(
        &self,
        user_id: &str,
        recent_messages: &[String],
    ) -> Result<String, MemoryError> {
        let query = self.query_text(recent_messages);
        if query.trim().is_empty() {
            return Ok(NO_RELEVANT_NOTES.to_owned());
        }
        let fragments = self.retrieve(user_id, &query).await?;
        Ok(assemble_context(&fragments))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use notemind_llm::mock::MockEmbedder;
    use serde_json::json;

    use super::*;
    use crate::in_memory_store::InMemoryVectorStore;
    use crate::vector_store::VectorPoint;

    fn payload(user: &str, title: &str, content: &str) -> HashMap<String, serde_json::Value> {
        serde_json::from_value(json!({
            "userId": user,
            "noteTitle": title,
            "content": content,
            "chunkIndex": 0,
            "sourceType": "text",
        }))
        .unwrap()
    }

    async fn seeded(mock: &MockEmbedder) -> Arc<InMemoryVectorStore> {
        let store = Arc::new(InMemoryVectorStore::new());
        store.ensure_collection("notes", 8).await.unwrap();
        let points = [
            ("a_chunk_0", "alice", "Garden", "water the tomatoes"),
            ("b_chunk_0", "bob", "Garden", "water the tomatoes"),
        ]
        .into_iter()
        .map(|(id, user, title, content)| VectorPoint {
            id: id.into(),
            vector: mock.vector_for(content),
            payload: payload(user, title, content),
        })
        .collect();
        store.upsert("notes", points).await.unwrap();
        store
    }

    fn retriever(store: Arc<InMemoryVectorStore>, mock: MockEmbedder) -> NoteRetriever<MockEmbedder> {
        NoteRetriever::new(store, "notes", mock, RetrievalConfig::default())
    }

    #[test]
    fn default_config() {
        let c = RetrievalConfig::default();
        assert_eq!(c.top_k, 5);
        assert!((c.score_threshold - 0.4).abs() < f32::EPSILON);
        assert_eq!(c.history_messages, 3);
    }

    #[test]
    fn query_text_takes_last_messages() {
        let r = retriever(Arc::new(InMemoryVectorStore::new()), MockEmbedder::default());
        let msgs: Vec<String> = ["one", "two", "three", "four"].map(String::from).to_vec();
        assert_eq!(r.query_text(&msgs), "two\nthree\nfour");
        assert_eq!(r.query_text(&msgs[..1]), "one");
        assert_eq!(r.query_text(&[]), "");
    }

    #[test]
    fn query_window_follows_config() {
        let config = RetrievalConfig {
            history_messages: 1,
            ..RetrievalConfig::default()
        };
        let r = NoteRetriever::new(
            Arc::new(InMemoryVectorStore::new()),
            "notes",
            MockEmbedder::default(),
            config,
        );
        assert_eq!(r.config().history_messages, 1);
        assert_eq!(r.query_text(&["one".into(), "two".into()]), "two");
    }

    #[tokio::test]
    async fn retrieve_only_returns_own_notes() {
        let mock = MockEmbedder::default();
        let store = seeded(&mock).await;
        let r = retriever(store, mock);
        let frags = r.retrieve("alice", "water the tomatoes").await.unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].title, "Garden");
        assert!(frags[0].score > 0.99);
    }

    #[tokio::test]
    async fn retrieve_drops_hits_below_threshold() {
        let mock = MockEmbedder::default();
        let store = seeded(&mock).await;
        let r = NoteRetriever::new(
            store,
            "notes",
            mock,
            RetrievalConfig {
                score_threshold: 1.5,
                ..RetrievalConfig::default()
            },
        );
        assert!(r.retrieve("alice", "water the tomatoes").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_collection_yields_no_fragments() {
        let mock = MockEmbedder::default();
        let r = retriever(Arc::new(InMemoryVectorStore::new()), mock.clone());
        assert!(r.retrieve("alice", "anything").await.unwrap().is_empty());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn build_context_renders_fragments() {
        let mock = MockEmbedder::default();
        let store = seeded(&mock).await;
        let r = retriever(store, mock);
        let ctx = r
            .build_context("alice", &["water the tomatoes".to_owned()])
            .await
            .unwrap();
        assert_eq!(
            ctx,
            "Title: Garden (from text note)\n\nContent:\nwater the tomatoes"
        );
    }

    #[tokio::test]
    async fn blank_conversation_returns_sentinel_without_embedding() {
        let mock = MockEmbedder::default();
        let store = seeded(&mock).await;
        let r = retriever(store, mock.clone());
        let ctx = r.build_context("alice", &["  ".to_owned()]).await.unwrap();
        assert_eq!(ctx, NO_RELEVANT_NOTES);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let store = seeded(&MockEmbedder::default()).await;
        let r = retriever(store, MockEmbedder::failing());
        let err = r.retrieve("alice", "x").await.unwrap_err();
        assert!(matches!(err, MemoryError::Llm(_)));
    }
}
