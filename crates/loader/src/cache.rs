//! Parsed-document cache.
//!
//! Memoizes parse results keyed by (parser identity, resource identity) so
//! the same physical resource is never reparsed across profile passes. The
//! cache is scoped to one `Loader` and therefore to one load run; it is not
//! a cross-run cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::document::Document;
use crate::resource::Resource;

/// Cache key used to save loading the same documents multiple times.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentsCacheKey {
    parser: &'static str,
    resource: PathBuf,
}

impl DocumentsCacheKey {
    pub fn new(parser: &'static str, resource: &Resource) -> Self {
        Self {
            parser,
            resource: resource.identity(),
        }
    }
}

/// Per-load-run memo of parsed documents.
#[derive(Default)]
pub struct DocumentsCache {
    documents: HashMap<DocumentsCacheKey, Rc<Vec<Document>>>,
}

impl DocumentsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DocumentsCacheKey) -> Option<Rc<Vec<Document>>> {
        self.documents.get(key).map(Rc::clone)
    }

    pub fn insert(&mut self, key: DocumentsCacheKey, documents: Vec<Document>) -> Rc<Vec<Document>> {
        let documents = Rc::new(documents);
        self.documents.insert(key, Rc::clone(&documents));
        documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn keys_equal_for_same_parser_and_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application.yaml");
        std::fs::write(&path, "a: 1\n").unwrap();
        // Different location strings for the same file share an identity.
        let a = Resource::new("file:./application.yaml", &path);
        let b = Resource::new("application.yaml", &path);
        assert_eq!(
            DocumentsCacheKey::new("yaml", &a),
            DocumentsCacheKey::new("yaml", &b)
        );
        assert_ne!(
            DocumentsCacheKey::new("yaml", &a),
            DocumentsCacheKey::new("properties", &a)
        );
    }

    #[test]
    fn cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("application.yaml");
        std::fs::write(&path, "a: 1\n").unwrap();
        let resource = Resource::new("file:./application.yaml", &path);
        let key = DocumentsCacheKey::new("yaml", &resource);
        let mut cache = DocumentsCache::new();
        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), Vec::new());
        assert!(cache.get(&key).is_some());
    }
}
