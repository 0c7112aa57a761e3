use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Stable identity of a tracked document (its path)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub display_name: String,
    pub text: String,
}

/// Supplies the active document and re-reads tracked documents on demand
pub trait DocumentSource {
    fn active_document(&self) -> Option<Document>;

    /// Current text of `id`, or `None` if it can no longer be read.
    fn current_text(&self, id: &DocumentId) -> Option<String>;
}

/// Tracks a single file on disk as the active document
#[derive(Debug, Clone)]
pub struct FileDocumentSource {
    path: PathBuf,
}

impl FileDocumentSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl DocumentSource for FileDocumentSource {
    fn active_document(&self) -> Option<Document> {
        let text = fs::read_to_string(&self.path).ok()?;
        Some(Document {
            id: DocumentId::new(self.path.display().to_string()),
            display_name: self.display_name(),
            text,
        })
    }

    fn current_text(&self, id: &DocumentId) -> Option<String> {
        fs::read_to_string(id.as_str()).ok()
    }
}

/// In-memory documents for tests and headless drivers.
///
/// Clones share storage, so edits made through one handle are visible to
/// the timer holding another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocuments {
    inner: Rc<RefCell<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    active: Option<DocumentId>,
    docs: HashMap<DocumentId, (String, String)>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a document and makes it the active one.
    pub fn open(&self, id: &str, display_name: &str, text: &str) -> DocumentId {
        let id = DocumentId::new(id);
        let mut inner = self.inner.borrow_mut();
        inner
            .docs
            .insert(id.clone(), (display_name.to_string(), text.to_string()));
        inner.active = Some(id.clone());
        id
    }

    pub fn set_text(&self, id: &DocumentId, text: &str) {
        if let Some(doc) = self.inner.borrow_mut().docs.get_mut(id) {
            doc.1 = text.to_string();
        }
    }

    pub fn remove(&self, id: &DocumentId) {
        let mut inner = self.inner.borrow_mut();
        inner.docs.remove(id);
        if inner.active.as_ref() == Some(id) {
            inner.active = None;
        }
    }

    pub fn close_active(&self) {
        self.inner.borrow_mut().active = None;
    }
}

impl DocumentSource for InMemoryDocuments {
    fn active_document(&self) -> Option<Document> {
        let inner = self.inner.borrow();
        let id = inner.active.as_ref()?;
        let (display_name, text) = inner.docs.get(id)?;
        Some(Document {
            id: id.clone(),
            display_name: display_name.clone(),
            text: text.clone(),
        })
    }

    fn current_text(&self, id: &DocumentId) -> Option<String> {
        self.inner.borrow().docs.get(id).map(|(_, text)| text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_source_reads_active_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chapter-1.md");
        fs::write(&path, "It was a dark and stormy night").unwrap();

        let source = FileDocumentSource::new(&path);
        let doc = source.active_document().unwrap();

        assert_eq!(doc.display_name, "chapter-1.md");
        assert_eq!(doc.text, "It was a dark and stormy night");
        assert_eq!(
            source.current_text(&doc.id).as_deref(),
            Some("It was a dark and stormy night")
        );
    }

    #[test]
    fn file_source_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.md");
        let source = FileDocumentSource::new(&path);

        assert!(source.active_document().is_none());
        assert!(source
            .current_text(&DocumentId::new(path.display().to_string()))
            .is_none());
    }

    #[test]
    fn file_source_sees_edits_and_deletion() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "one").unwrap();

        let source = FileDocumentSource::new(&path);
        let id = source.active_document().unwrap().id;

        fs::write(&path, "one two three").unwrap();
        assert_eq!(source.current_text(&id).as_deref(), Some("one two three"));

        fs::remove_file(&path).unwrap();
        assert!(source.current_text(&id).is_none());
    }

    #[test]
    fn in_memory_clones_share_state() {
        let docs = InMemoryDocuments::new();
        let handle = docs.clone();
        let id = docs.open("a.md", "a.md", "hello");

        handle.set_text(&id, "hello there");
        assert_eq!(docs.current_text(&id).as_deref(), Some("hello there"));

        handle.remove(&id);
        assert!(docs.active_document().is_none());
        assert!(docs.current_text(&id).is_none());
    }

    #[test]
    fn in_memory_close_active_keeps_text() {
        let docs = InMemoryDocuments::new();
        let id = docs.open("a.md", "a.md", "hello");
        docs.close_active();

        assert!(docs.active_document().is_none());
        assert_eq!(docs.current_text(&id).as_deref(), Some("hello"));
    }
}
