use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use super::{DocumentError, Note, SourceType};

#[cfg(feature = "pdf")]
mod pdf;
mod text;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<LoadedNote, DocumentError>> + Send + 'a>>;

/// Note content read from disk, before it is assigned an id and owner.
#[derive(Debug, Clone)]
pub struct LoadedNote {
    pub title: String,
    pub content: String,
    pub source_type: SourceType,
    pub file_name: Option<String>,
}

impl LoadedNote {
    #[must_use]
    pub fn into_note(self, id: impl Into<String>, user_id: impl Into<String>) -> Note {
        Note {
            id: id.into(),
            user_id: user_id.into(),
            title: self.title,
            content: self.content,
            source_type: self.source_type,
            file_name: self.file_name,
        }
    }
}

pub trait NoteLoader: Send + Sync {
    fn load<'a>(&'a self, path: &'a Path) -> LoadFuture<'a>;

    fn supported_extensions(&self) -> &[&str];
}

/// Pick a loader by file extension.
///
/// # Errors
///
/// Returns `DocumentError::UnsupportedFormat` when no loader handles the extension.
pub fn loader_for(path: &Path) -> Result<Box<dyn NoteLoader>, DocumentError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = TextLoader::default();
    if text.supported_extensions().contains(&ext.as_str()) {
        return Ok(Box::new(text));
    }
    #[cfg(feature = "pdf")]
    if ext == "pdf" {
        return Ok(Box::new(PdfLoader::default()));
    }
    Err(DocumentError::UnsupportedFormat(ext))
}

/// File stem used as the note title when the file does not provide one.
fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map_or_else(|| "Untitled".to_owned(), str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_for_known_text_extensions() {
        assert!(loader_for(Path::new("a.txt")).is_ok());
        assert!(loader_for(Path::new("a.MD")).is_ok());
    }

    #[test]
    fn loader_for_unknown_extension() {
        let err = loader_for(Path::new("a.xlsx")).err().unwrap();
        assert!(matches!(err, DocumentError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn title_defaults_to_stem() {
        assert_eq!(title_from_path(Path::new("/tmp/meeting notes.md")), "meeting notes");
        assert_eq!(title_from_path(Path::new("/")), "Untitled");
    }

    #[test]
    fn into_note_assigns_owner() {
        let loaded = LoadedNote {
            title: "t".into(),
            content: "c".into(),
            source_type: SourceType::Text,
            file_name: None,
        };
        let note = loaded.into_note("n1", "u1");
        assert_eq!(note.id, "n1");
        assert_eq!(note.user_id, "u1");
        assert_eq!(note.title, "t");
    }
}
