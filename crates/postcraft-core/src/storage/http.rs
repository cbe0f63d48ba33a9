//! HTTP-backed collaborators.
//!
//! Media is `PUT` to `{media_endpoint}/{key}`; records are `POST`ed as JSON to
//! the posts endpoint. Both send the configured bearer token.

use async_trait::async_trait;

use super::provider::{MediaStore, PostRepository};
use crate::error::PipelineError;
use crate::types::PostRecord;

/// Object store reached over HTTP.
pub struct HttpMediaStore {
    endpoint: String,
    public_base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpMediaStore {
    pub fn new(endpoint: &str, public_base_url: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Where a key is uploaded to.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, key)
    }

    /// Where a key can be fetched from afterwards.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, PipelineError> {
        let size = bytes.len();
        let resp = self
            .client
            .put(self.object_url(key))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| PipelineError::Upload {
                key: key.to_string(),
                message: format!("Request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Upload {
                key: key.to_string(),
                message: format!("HTTP {status}: {text}"),
            });
        }

        tracing::debug!("Uploaded {size} bytes to {}", self.object_url(key));
        Ok(self.public_url(key))
    }
}

/// Document endpoint receiving post records.
pub struct HttpPostRepository {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl HttpPostRepository {
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PostRepository for HttpPostRepository {
    fn name(&self) -> &str {
        "http"
    }

    async fn create(&self, record: &PostRecord) -> Result<(), PipelineError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(record)
            .send()
            .await
            .map_err(|e| PipelineError::MetadataWrite {
                id: record.id.clone(),
                message: format!("Request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::MetadataWrite {
                id: record.id.clone(),
                message: format!("HTTP {status}: {text}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_without_double_slash() {
        let store = HttpMediaStore::new(
            "https://store.example.com/media/",
            "https://cdn.example.com/",
            "t",
        );
        assert_eq!(
            store.object_url("posts/u1/a.jpg"),
            "https://store.example.com/media/posts/u1/a.jpg"
        );
        assert_eq!(
            store.public_url("posts/u1/a.jpg"),
            "https://cdn.example.com/posts/u1/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upload_error() {
        let store = HttpMediaStore::new("http://127.0.0.1:9", "http://127.0.0.1:9", "t");
        let err = store
            .upload(vec![1], "posts/u/a.jpg", "image/jpeg")
            .await
            .unwrap_err();
        match err {
            PipelineError::Upload { key, .. } => assert_eq!(key, "posts/u/a.jpg"),
            other => panic!("expected Upload, got {other:?}"),
        }
    }
}
