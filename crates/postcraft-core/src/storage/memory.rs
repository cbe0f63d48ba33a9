//! In-memory collaborators for embedding and tests.
//!
//! Both can be switched into a failing mode to exercise the submission
//! failure path.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use super::provider::{MediaStore, PostRepository};
use crate::error::PipelineError;
use crate::types::PostRecord;

/// One stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Keeps uploads in a vector and hands out `memory://` URLs.
#[derive(Debug, Default)]
pub struct InMemoryMediaStore {
    objects: Mutex<Vec<StoredObject>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following upload fail with `message` (`None` heals it).
    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(String::from);
    }

    pub fn uploads(&self) -> Vec<StoredObject> {
        lock(&self.objects).clone()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, PipelineError> {
        if let Some(message) = lock(&self.failure).clone() {
            return Err(PipelineError::Upload {
                key: key.to_string(),
                message,
            });
        }
        lock(&self.objects).push(StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(format!("memory://{key}"))
    }
}

/// Keeps created records in a vector.
#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    records: Mutex<Vec<PostRecord>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(String::from);
    }

    pub fn records(&self) -> Vec<PostRecord> {
        lock(&self.records).clone()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, record: &PostRecord) -> Result<(), PipelineError> {
        if let Some(message) = lock(&self.failure).clone() {
            return Err(PipelineError::MetadataWrite {
                id: record.id.clone(),
                message,
            });
        }
        lock(&self.records).push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_records_uploads() {
        let store = InMemoryMediaStore::new();
        let url = store.upload(vec![7], "k/a.jpg", "image/jpeg").await.unwrap();
        assert_eq!(url, "memory://k/a.jpg");
        assert_eq!(store.uploads()[0].content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_failure_mode() {
        let store = InMemoryMediaStore::new();
        store.set_failure(Some("bucket offline"));
        assert!(store.upload(vec![], "k", "image/jpeg").await.is_err());
        store.set_failure(None);
        assert!(store.upload(vec![], "k", "image/jpeg").await.is_ok());

        let repo = InMemoryPostRepository::new();
        repo.set_failure(Some("quota"));
        let err = repo
            .create(&PostRecord::new("x", "u", "url", ""))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota"));
        assert!(repo.records().is_empty());
    }
}
