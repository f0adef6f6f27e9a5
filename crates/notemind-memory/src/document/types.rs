use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a note's text came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Text,
    Pdf,
}

impl SourceType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
        }
    }

    /// Parse a payload tag. Unknown tags yield `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's note as handed to the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub source_type: SourceType,
    pub file_name: Option<String>,
}

/// A bounded slice of a note with its byte offsets in the original text.
///
/// `content` is the trimmed slice `text[start_index..end_index]`, so its
/// length may be shorter than `end_index - start_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub start_index: usize,
    pub end_index: usize,
    pub chunk_index: usize,
}

/// Persistence record for one indexed chunk, returned by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub note_id: String,
    pub content: String,
    pub chunk_index: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub vector_id: String,
}

/// Metadata attached to every vector point of a note chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPayload {
    pub user_id: String,
    pub note_id: String,
    pub note_title: String,
    pub content: String,
    pub chunk_index: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub content_length: usize,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ChunkPayload {
    #[must_use]
    pub fn new(note: &Note, chunk: &Chunk) -> Self {
        Self {
            user_id: note.user_id.clone(),
            note_id: note.id.clone(),
            note_title: note.title.clone(),
            content: chunk.content.clone(),
            chunk_index: chunk.chunk_index,
            start_index: chunk.start_index,
            end_index: chunk.end_index,
            content_length: chunk.content.len(),
            source_type: note.source_type,
            file_name: note.file_name.clone(),
        }
    }

    /// Flatten into the key/value map stored next to the vector.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn into_map(self) -> Result<HashMap<String, serde_json::Value>, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(self)?)
    }
}

/// Vector id of a chunk: `{note_id}_chunk_{chunk_index}`.
#[must_use]
pub fn vector_id(note_id: &str, chunk_index: usize) -> String {
    format!("{note_id}_chunk_{chunk_index}")
}
