//! Collaborators a submission writes to.
//!
//! A [`MediaStore`] takes the finished media buffer and returns a URL; a
//! [`PostRepository`] persists the post record that points at it. Backends:
//! local filesystem, HTTP, and in-memory.

pub(crate) mod http;
pub(crate) mod local;
pub(crate) mod memory;
pub(crate) mod provider;

pub use http::{HttpMediaStore, HttpPostRepository};
pub use local::{JsonlPostRepository, LocalMediaStore};
pub use memory::{InMemoryMediaStore, InMemoryPostRepository, StoredObject};
pub use provider::{resolve_env_var, Collaborators, MediaStore, PostRepository, StoreFactory};
