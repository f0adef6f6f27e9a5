//! Grounding context rendered from retrieved note fragments.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::SourceType;

/// Returned by [`assemble_context`] when no fragment carries content.
pub const NO_RELEVANT_NOTES: &str = "No relevant notes found.";

const UNTITLED: &str = "Untitled note";

fn default_title() -> String {
    UNTITLED.to_owned()
}

/// A note chunk returned by vector search, with its score and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedFragment {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub chunk_index: usize,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl RetrievedFragment {
    /// Build a fragment from a stored chunk payload.
    ///
    /// Missing or mistyped fields degrade instead of failing: the title becomes
    /// `"Untitled note"`, an unknown source type becomes [`SourceType::Text`],
    /// and a missing content leaves `content` as `None`.
    #[must_use]
    pub fn from_payload(payload: &HashMap<String, serde_json::Value>, score: f32) -> Self {
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        };
        Self {
            title: text("noteTitle").unwrap_or_else(default_title),
            content: text("content"),
            score,
            chunk_index: payload
                .get("chunkIndex")
                .and_then(serde_json::Value::as_u64)
                .and_then(|i| usize::try_from(i).ok())
                .unwrap_or_default(),
            source_type: payload
                .get("sourceType")
                .and_then(serde_json::Value::as_str)
                .and_then(SourceType::from_tag)
                .unwrap_or_default(),
            file_name: text("fileName"),
        }
    }

    fn render(&self, content: &str) -> String {
        match (self.source_type, self.file_name.as_deref()) {
            (SourceType::Pdf, Some(file)) => {
                format!("Title: {} (from PDF: {file})\n\nContent:\n{content}", self.title)
            }
            (source, _) => {
                format!("Title: {} (from {source} note)\n\nContent:\n{content}", self.title)
            }
        }
    }
}

/// Render fragments into one prompt block, in the order given.
///
/// Fragments without content are skipped. Returns [`NO_RELEVANT_NOTES`] when
/// nothing is left to render.
#[must_use]
pub fn assemble_context(fragments: &[RetrievedFragment]) -> String {
    let blocks: Vec<String> = fragments
        .iter()
        .filter_map(|f| {
            f.content
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(|c| f.render(c))
        })
        .collect();

    if blocks.is_empty() {
        return NO_RELEVANT_NOTES.to_owned();
    }
    blocks.join("\n\n")
}

/// Keep fragments scoring strictly above `min_score`, preserving order.
#[must_use]
pub fn filter_by_score(fragments: &[RetrievedFragment], min_score: f32) -> Vec<RetrievedFragment> {
    fragments
        .iter()
        .filter(|f| f.score > min_score)
        .cloned()
        .collect()
}
