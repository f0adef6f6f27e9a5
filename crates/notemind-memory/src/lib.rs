//! Note chunking, vector indexing and retrieval context for notemind.

pub mod cache;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod in_memory_store;
pub mod retriever;
pub mod vector_store;

pub use cache::{CacheService, InMemoryCache, question_cache_key};
pub use context::{NO_RELEVANT_NOTES, RetrievedFragment, assemble_context, filter_by_score};
pub use embedding::{DEFAULT_EMBED_BATCH_SIZE, embed_in_batches};
pub use error::MemoryError;
pub use in_memory_store::InMemoryVectorStore;
pub use retriever::{NoteRetriever, RetrievalConfig};
pub use vector_store::{
    FieldCondition, FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};
