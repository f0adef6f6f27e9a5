use std::path::Path;
use std::sync::Arc;

use notemind_llm::EmbeddingProvider;

use super::{
    ChunkPayload, DocumentError, Note, NoteLoader, StoredChunk, TextSplitter, embedding_text,
    vector_id,
};
use crate::embedding::{DEFAULT_EMBED_BATCH_SIZE, embed_in_batches};
use crate::error::MemoryError;
use crate::vector_store::{VectorPoint, VectorStore};

/// Split, embed and index notes into one vector collection.
pub struct IngestionPipeline<P: EmbeddingProvider> {
    splitter: TextSplitter,
    store: Arc<dyn VectorStore>,
    collection: String,
    provider: P,
    batch_size: usize,
}

impl<P: EmbeddingProvider> IngestionPipeline<P> {
    pub fn new(
        splitter: TextSplitter,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        provider: P,
    ) -> Self {
        Self {
            splitter,
            store,
            collection: collection.into(),
            provider,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ingest a note: split -> embed -> upsert. Returns the stored chunk records.
    ///
    /// Chunks with blank content are skipped, so an empty note stores nothing
    /// and never reaches the embedder.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or vector storage fails.
    pub async fn ingest(&self, note: &Note) -> Result<Vec<StoredChunk>, DocumentError> {
        let chunks: Vec<_> = self
            .splitter
            .split(&note.content)
            .into_iter()
            .filter(|c| !c.content.trim().is_empty())
            .collect();
        if chunks.is_empty() {
            tracing::debug!(note_id = %note.id, "note has no content, nothing to index");
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks
            .iter()
            .map(|c| embedding_text(&note.title, &c.content))
            .collect();
        let vectors = embed_in_batches(&self.provider, &texts, self.batch_size).await?;
        if vectors.len() != chunks.len() {
            return Err(MemoryError::VectorCountMismatch {
                expected: chunks.len(),
                got: vectors.len(),
            }
            .into());
        }

        let dims = vectors.first().map_or(0, Vec::len) as u64;
        self.store
            .ensure_collection(&self.collection, dims)
            .await
            .map_err(MemoryError::from)?;

        let mut points = Vec::with_capacity(chunks.len());
        let mut stored = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.iter().zip(vectors) {
            let id = vector_id(&note.id, chunk.chunk_index);
            let payload = ChunkPayload::new(note, chunk)
                .into_map()
                .map_err(MemoryError::from)?;
            points.push(VectorPoint {
                id: id.clone(),
                vector,
                payload,
            });
            stored.push(StoredChunk {
                note_id: note.id.clone(),
                content: chunk.content.clone(),
                chunk_index: chunk.chunk_index,
                start_index: chunk.start_index,
                end_index: chunk.end_index,
                vector_id: id,
            });
        }

        self.store
            .upsert(&self.collection, points)
            .await
            .map_err(MemoryError::from)?;

        tracing::info!(
            note_id = %note.id,
            chunks = stored.len(),
            provider = self.provider.name(),
            "indexed note"
        );
        Ok(stored)
    }

    /// Load a file with `loader` and ingest it as note `note_id` owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, embedding, or storage fails.
    pub async fn load_and_ingest(
        &self,
        loader: &(dyn NoteLoader + '_),
        path: &Path,
        note_id: &str,
        user_id: &str,
    ) -> Result<Vec<StoredChunk>, DocumentError> {
        let note = loader.load(path).await?.into_note(note_id, user_id);
        self.ingest(&note).await
    }

    /// Delete the vectors of previously stored chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector store rejects the deletion.
    pub async fn remove(&self, chunks: &[StoredChunk]) -> Result<(), DocumentError> {
        let ids: Vec<String> = chunks.iter().map(|c| c.vector_id.clone()).collect();
        self.store
            .delete_by_ids(&self.collection, ids)
            .await
            .map_err(MemoryError::from)?;
        Ok(())
    }
}
