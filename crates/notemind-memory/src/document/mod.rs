pub mod error;
pub mod loader;
pub mod pipeline;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use loader::{LoadedNote, NoteLoader, TextLoader, loader_for};
pub use pipeline::IngestionPipeline;
pub use splitter::{ChunkIter, SplitterConfig, TextSplitter, chunk_text, combine_chunks};
pub use types::{Chunk, ChunkPayload, Note, SourceType, StoredChunk, vector_id};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Text sent to the embedder for an indexed chunk: the note title, a blank line, the chunk.
///
/// Only applied at index time. Queries are embedded without a title.
#[must_use]
pub fn embedding_text(title: &str, chunk_content: &str) -> String {
    format!("{title}\n\n{chunk_content}")
}
