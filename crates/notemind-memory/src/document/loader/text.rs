use std::path::Path;

use super::{LoadFuture, LoadedNote, NoteLoader, title_from_path};
use crate::document::{DEFAULT_MAX_FILE_SIZE, DocumentError, SourceType};

pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl NoteLoader for TextLoader {
    fn load<'a>(&'a self, path: &'a Path) -> LoadFuture<'a> {
        Box::pin(async move {
            let meta = tokio::fs::metadata(path).await?;
            if meta.len() > self.max_file_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let content = tokio::fs::read_to_string(path).await?;
            tracing::debug!(path = %path.display(), bytes = content.len(), "loaded text note");

            Ok(LoadedNote {
                title: title_from_path(path),
                content,
                source_type: SourceType::Text,
                file_name: None,
            })
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}
