use notemind_memory::MemoryError;
use notemind_memory::document::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("rate limit exceeded for user {0}")]
    RateLimited(String),

    #[error("context retrieval timed out after {0}s")]
    Timeout(u64),

    #[error("retrieval failed: {0}")]
    Memory(#[from] MemoryError),

    #[error("ingestion failed: {0}")]
    Document(#[from] DocumentError),
}
