//! In-memory object store

use crate::{validate_path, StoreError};
use docmeta_domain::ObjectStore;
use std::collections::BTreeMap;

/// Object store backed by an ordered map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryStore {
    type Error = StoreError;

    fn list(&self, prefix: &str) -> Result<Vec<String>, Self::Error> {
        Ok(self
            .objects
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, _)| path.clone())
            .collect())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, Self::Error> {
        self.objects
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error> {
        validate_path(path)?;
        self.objects.insert(path.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_overwrite() {
        let mut store = MemoryStore::new();
        store.put("raw/a.txt", b"one").unwrap();
        store.put("raw/a.txt", b"two").unwrap();

        assert_eq!(store.get("raw/a.txt").unwrap(), b"two");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_by_prefix_in_lexical_order() {
        let mut store = MemoryStore::new();
        for path in ["raw/b.txt", "raw/a.txt", "rawer/c.txt", "batches/a_batches.json"] {
            store.put(path, b"").unwrap();
        }

        assert_eq!(store.list("raw/").unwrap(), vec!["raw/a.txt", "raw/b.txt"]);
        assert_eq!(store.list("raw").unwrap().len(), 3);
        assert_eq!(store.list("").unwrap().len(), 4);
        assert!(store.list("missing/").unwrap().is_empty());
    }

    #[test]
    fn test_missing_object() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("nope"), Err(StoreError::NotFound(_))));
    }
}
