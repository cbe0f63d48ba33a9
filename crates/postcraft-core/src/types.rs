//! Core data types written by the pipeline.
//!
//! A [`PostRecord`] is the metadata handed to the post repository once the
//! media is uploaded.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of a generated post id.
pub const POST_ID_LEN: usize = 20;

/// A persisted post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    // === Identity ===
    /// Allocated before any write
    pub id: String,

    /// Who posted it
    pub author_id: String,

    // === Content ===
    /// Retrievable URL returned by the media store
    pub image_url: String,

    /// Caption text (may be empty)
    pub caption: String,

    /// When the record was assembled
    pub created_at: Timestamp,

    // === Social ===
    /// User ids that liked the post; empty on creation
    pub likes: Vec<String>,

    /// Comments; empty on creation
    pub comments: Vec<String>,
}

impl PostRecord {
    /// A fresh record with no likes or comments, timestamped now.
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        image_url: impl Into<String>,
        caption: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            image_url: image_url.into(),
            caption: caption.into(),
            created_at: Timestamp::now(),
            likes: Vec::new(),
            comments: Vec::new(),
        }
    }
}

/// Seconds + nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        // A clock before 1970 is reported as the epoch
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            seconds: elapsed.as_secs() as i64,
            nanos: elapsed.subsec_nanos(),
        }
    }
}

/// Allocate a new 20-character alphanumeric post id.
pub fn allocate_post_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(POST_ID_LEN)
        .map(char::from)
        .collect()
}
