//! In-memory object store.
//!
//! Backs the test suites and local development. Keys list in sorted
//! order, which keeps stage runs deterministic under test.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PipelineError, Result};
use crate::traits::store::ObjectStore;

/// An in-memory [`ObjectStore`] keyed by full object key.
#[derive(Clone)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    base_url: String,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_base_url("memory://bucket")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            base_url: base_url.into(),
        }
    }

    /// Number of stored objects, for test assertions.
    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().unwrap().is_empty()
    }

    /// Whether an object exists at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().unwrap().contains_key(key)
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String> {
        self.objects
            .write()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(self.object_url(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .read()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| PipelineError::not_found(key))
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        if !self.contains(key) {
            return Err(PipelineError::not_found(key));
        }
        Ok(format!(
            "{}?expires={}",
            self.object_url(key),
            expires_in.as_secs()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_round_trip() {
        let store = MemoryObjectStore::new();
        let url = store.put("raw/a.pdf", b"bytes").await.unwrap();
        assert_eq!(url, "memory://bucket/raw/a.pdf");
        assert_eq!(store.get("raw/a.pdf").await.unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.get("raw/missing.pdf").await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_filters_by_prefix_in_order() {
        let store = MemoryObjectStore::new();
        store.put("raw/b.pdf", b"b").await.unwrap();
        store.put("out/a.txt", b"a").await.unwrap();
        store.put("raw/a.pdf", b"a").await.unwrap();

        assert_eq!(
            store.list("raw/").await.unwrap(),
            vec!["raw/a.pdf".to_string(), "raw/b.pdf".to_string()]
        );
        assert_eq!(store.list("nothing/").await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn overwrite_is_idempotent() {
        let store = MemoryObjectStore::new();
        let first = store.put("raw/a.pdf", b"bytes").await.unwrap();
        let second = store.put("raw/a.pdf", b"bytes").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn presigned_url_requires_existing_object() {
        let store = MemoryObjectStore::new();
        store.put("raw/a.pdf", b"bytes").await.unwrap();

        let url = store
            .presigned_url("raw/a.pdf", Duration::from_secs(300))
            .await
            .unwrap();
        assert!(url.ends_with("?expires=300"));

        let err = store
            .presigned_url("raw/missing.pdf", Duration::from_secs(300))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }
}
