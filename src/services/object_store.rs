//! Object store abstraction.
//!
//! The repository only needs a handful of capabilities from the bucket: put,
//! get, list, tag and delete. Backends implement [`ObjectStore`] and are
//! shared as `Arc<dyn ObjectStore>`; the client handle inside must be safe for
//! concurrent use.

use crate::models::{file::BlobStream, metadata::Tag};
use async_trait::async_trait;
use bytes::Bytes;
use std::{collections::HashMap, fmt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("content digest mismatch for `{0}`")]
    DigestMismatch(String),
    #[error("invalid tag on `{key}`: {reason}")]
    InvalidTag { key: String, reason: String },
    #[error("invalid metadata on `{key}`: {reason}")]
    InvalidMetadata { key: String, reason: String },
    #[error("backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Canned access control applied at write time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectAcl {
    Private,
}

/// Server-side encryption requested at write time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encryption {
    Aes256,
}

/// Everything needed for a single write.
#[derive(Clone)]
pub struct PutObjectRequest {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub content_disposition: String,
    /// Base64 MD5 of `body`; the backend rejects the write on mismatch.
    pub content_md5: String,
    pub metadata: HashMap<String, String>,
    pub acl: ObjectAcl,
    pub encryption: Encryption,
}

impl fmt::Debug for PutObjectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutObjectRequest")
            .field("key", &self.key)
            .field("size", &self.body.len())
            .field("content_type", &self.content_type)
            .field("acl", &self.acl)
            .field("encryption", &self.encryption)
            .finish_non_exhaustive()
    }
}

/// An object opened for reading.
pub struct GetObjectOutput {
    pub metadata: HashMap<String, String>,
    pub content_type: Option<String>,
    pub content_length: i64,
    pub body: BlobStream,
}

/// One entry of a bucket listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Write an object. Exactly one attempt.
    async fn put(&self, request: PutObjectRequest) -> StoreResult<()>;

    /// Open an object with its metadata. Missing keys map to `NotFound`.
    async fn get(&self, key: &str) -> StoreResult<GetObjectOutput>;

    /// Every object in the bucket, in the backend's listing order.
    async fn list_keys(&self) -> StoreResult<Vec<ObjectSummary>>;

    /// Replace the tag set of an object.
    async fn set_tags(&self, key: &str, tags: Vec<Tag>) -> StoreResult<()>;

    /// Tag set of an object.
    async fn get_tags(&self, key: &str) -> StoreResult<Vec<Tag>>;

    /// Remove an object.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// One cheap round trip proving the bucket is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Base64-encoded MD5 digest, as carried in `Content-MD5`.
pub fn content_md5(body: &[u8]) -> String {
    use base64::{Engine as _, engine::general_purpose};
    general_purpose::STANDARD.encode(md5::compute(body).0)
}
