use std::path::Path;

use super::{LoadFuture, LoadedNote, NoteLoader, title_from_path};
use crate::document::{DEFAULT_MAX_FILE_SIZE, DocumentError, SourceType};

pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl NoteLoader for PdfLoader {
    fn load<'a>(&'a self, path: &'a Path) -> LoadFuture<'a> {
        Box::pin(async move {
            let meta = tokio::fs::metadata(path).await?;
            if meta.len() > self.max_file_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let path_buf = path.to_path_buf();
            let content = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&path_buf).map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;
            tracing::debug!(path = %path.display(), bytes = content.len(), "extracted PDF note");

            Ok(LoadedNote {
                title: title_from_path(path),
                content,
                source_type: SourceType::Pdf,
                file_name: path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_owned),
            })
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}
