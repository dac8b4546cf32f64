use dashmap::DashMap;
use url::Url;

/// An open document under full text sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    language_id: String,
    version: i32,
}

impl Document {
    pub fn new(text: String, language_id: String, version: i32) -> Self {
        Self {
            text,
            language_id,
            version,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> i32 {
        self.version
    }
}

// The central store for all open documents.
#[derive(Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, uri: Url, text: String, language_id: String, version: i32) {
        self.documents
            .insert(uri, Document::new(text, language_id, version));
    }

    /// Replace the text of an open document. Returns false if it is not open.
    pub fn update(&self, uri: &Url, text: String, version: i32) -> bool {
        match self.documents.get_mut(uri) {
            Some(mut document) => {
                // Stale versions can arrive after a newer full sync
                if version >= document.version {
                    document.text = text;
                    document.version = version;
                }
                true
            }
            None => false,
        }
    }

    /// Owned copy of a document, for use across await points.
    pub fn snapshot(&self, uri: &Url) -> Option<Document> {
        self.documents.get(uri).map(|doc| doc.clone())
    }

    pub fn close(&self, uri: &Url) -> Option<Document> {
        self.documents.remove(uri).map(|(_, doc)| doc)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///ws/a.js").unwrap()
    }

    #[test]
    fn open_update_close() {
        let store = DocumentStore::new();
        store.open(uri(), "a".to_string(), "javascript".to_string(), 1);

        assert!(store.update(&uri(), "b".to_string(), 2));
        assert_eq!(store.snapshot(&uri()).unwrap().text(), "b");

        let closed = store.close(&uri()).unwrap();
        assert_eq!(closed.version(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn stale_versions_are_dropped() {
        let store = DocumentStore::new();
        store.open(uri(), "v3".to_string(), "javascript".to_string(), 3);

        store.update(&uri(), "v2".to_string(), 2);

        assert_eq!(store.snapshot(&uri()).unwrap().text(), "v3");
    }

    #[test]
    fn updating_unknown_document_reports_false() {
        let store = DocumentStore::new();
        assert!(!store.update(&uri(), "x".to_string(), 1));
    }
}
