use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::document::{SpecDocument, content_hash, normalize_path};
use crate::error::ParseError;

/// Parsed-document cache keyed by file path and content hash.
///
/// Every `get` re-reads the file and compares its hash with the cached entry, so an
/// edited file is never served stale; `invalidate` drops an entry explicitly.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: RwLock<HashMap<PathBuf, Arc<SpecDocument>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`, reusing the cached parse when the content is unchanged.
    pub fn get(&self, path: &Path) -> Result<Arc<SpecDocument>, ParseError> {
        let key = normalize_path(path);
        let content = fs::read_to_string(&key).map_err(|source| ParseError::Io {
            path: key.clone(),
            source,
        })?;
        let hash = content_hash(content.as_bytes());

        if let Some(doc) = self
            .docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .filter(|doc| doc.content_hash() == hash)
        {
            return Ok(Arc::clone(doc));
        }

        let doc = Arc::new(SpecDocument::parse(&key, &content)?);
        log::debug!("parsed {} ({})", key.display(), &hash[..12]);
        self.docs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&doc));
        Ok(doc)
    }

    /// Drop the cached parse of `path`.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.docs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize_path(path))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_file_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("api.yaml");
        fs::write(&file, "openapi: 3.0.0\n").unwrap();

        let store = DocumentStore::new();
        let first = store.get(&file).unwrap();
        let second = store.get(&file).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_edited_file_is_reparsed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("api.yaml");
        fs::write(&file, "title: one\n").unwrap();

        let store = DocumentStore::new();
        let first = store.get(&file).unwrap();
        fs::write(&file, "title: two\n").unwrap();
        let second = store.get(&file).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first.content_hash(), second.content_hash());
    }

    #[test]
    fn test_invalidate_drops_entry() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("api.yaml");
        fs::write(&file, "a: 1\n").unwrap();

        let store = DocumentStore::new();
        store.get(&file).unwrap();
        assert!(store.invalidate(&file));
        assert!(store.is_empty());
        assert!(!store.invalidate(&file));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let store = DocumentStore::new();
        assert!(store.get(Path::new("/definitely/not/here.yaml")).is_err());
    }
}
