//! Filesystem-backed collaborators.
//!
//! Media lands under a directory and is addressed with a `file://` URL; post
//! records are appended to a JSON Lines file.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::provider::{MediaStore, PostRepository};
use crate::error::PipelineError;
use crate::types::PostRecord;

/// Writes media under a root directory.
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a key below the root, refusing anything that would escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, PipelineError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(PipelineError::Upload {
                key: key.to_string(),
                message: "Destination key must be a relative path".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, PipelineError> {
        let path = self.path_for(key)?;
        let upload_err = |e: std::io::Error| PipelineError::Upload {
            key: key.to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(upload_err)?;
        }
        tokio::fs::write(&path, &bytes).await.map_err(upload_err)?;

        let absolute = tokio::fs::canonicalize(&path).await.map_err(upload_err)?;
        tracing::debug!(
            "Stored {} bytes ({content_type}) at {}",
            bytes.len(),
            absolute.display()
        );
        Ok(format!("file://{}", absolute.display()))
    }
}

/// Appends one JSON object per line.
pub struct JsonlPostRepository {
    path: PathBuf,
}

impl JsonlPostRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back, skipping blank lines.
    pub async fn read_all(&self) -> Result<Vec<PostRecord>, PipelineError> {
        let read_err = |message: String| PipelineError::MetadataWrite {
            id: "*".to_string(),
            message,
        };
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_err(e.to_string())),
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|e| read_err(e.to_string())))
            .collect()
    }
}

#[async_trait]
impl PostRepository for JsonlPostRepository {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn create(&self, record: &PostRecord) -> Result<(), PipelineError> {
        let write_err = |message: String| PipelineError::MetadataWrite {
            id: record.id.clone(),
            message,
        };

        let mut line = serde_json::to_string(record).map_err(|e| write_err(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_err(e.to_string()))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| write_err(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| write_err(e.to_string()))?;
        file.flush().await.map_err(|e| write_err(e.to_string()))?;

        tracing::debug!("Appended post {} to {}", record.id, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path());

        let url = store
            .upload(vec![1, 2, 3], "posts/u1/abc.jpg", "image/jpeg")
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("posts/u1/abc.jpg"));

        let written = std::fs::read(dir.path().join("posts/u1/abc.jpg")).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_upload_rejects_escaping_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path());

        for key in ["../evil.jpg", "/etc/passwd", ""] {
            let err = store.upload(vec![0], key, "image/jpeg").await.unwrap_err();
            assert!(matches!(err, PipelineError::Upload { .. }), "{key}");
        }
    }

    #[tokio::test]
    async fn test_jsonl_appends_records() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonlPostRepository::new(dir.path().join("nested/posts.jsonl"));

        let first = PostRecord::new("a", "u1", "file:///a.jpg", "one");
        let second = PostRecord::new("b", "u1", "file:///b.jpg", "two\nlines");
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();

        let content = std::fs::read_to_string(repo.path()).unwrap();
        assert_eq!(content.lines().count(), 2);

        let records = repo.read_all().await.unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[tokio::test]
    async fn test_read_all_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonlPostRepository::new(dir.path().join("none.jsonl"));
        assert!(repo.read_all().await.unwrap().is_empty());
    }
}
