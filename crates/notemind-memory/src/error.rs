#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("vector store error: {0}")]
    VectorStore(#[from] crate::vector_store::VectorStoreError),

    #[error("embedding error: {0}")]
    Llm(#[from] notemind_llm::LlmError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("embedder returned {got} vectors for {expected} inputs")]
    VectorCountMismatch { expected: usize, got: usize },
}
