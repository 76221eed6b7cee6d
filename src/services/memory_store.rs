//! In-process object store.
//!
//! Keeps every object in a `BTreeMap`, so listings come back in key order the
//! way a bucket listing does. Used by `--backend memory` for local runs and by
//! the test suite.

use crate::{
    models::{file::BlobStream, metadata::Tag},
    services::object_store::{
        GetObjectOutput, ObjectStore, ObjectSummary, PutObjectRequest, StoreError, StoreResult,
        content_md5,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::RwLock;
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    io,
    sync::LazyLock,
};
use tracing::debug;

/// Characters S3 accepts in tag keys and values.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{Z}\p{N}_.:/=+\-@]*$").expect("tag pattern is a valid regex")
});

const MAX_TAGS: usize = 10;
const MAX_TAG_KEY_LEN: usize = 128;
const MAX_TAG_VALUE_LEN: usize = 256;

/// Apply S3's tag-set limits.
fn validate_tags(key: &str, tags: &[Tag]) -> StoreResult<()> {
    let invalid = |reason: String| StoreError::InvalidTag {
        key: key.to_string(),
        reason,
    };
    if tags.len() > MAX_TAGS {
        return Err(invalid(format!(
            "{} tags, at most {} allowed",
            tags.len(),
            MAX_TAGS
        )));
    }
    for tag in tags {
        if tag.key.is_empty() || tag.key.chars().count() > MAX_TAG_KEY_LEN {
            return Err(invalid(format!("tag key `{}` has a bad length", tag.key)));
        }
        if tag.value.chars().count() > MAX_TAG_VALUE_LEN {
            return Err(invalid(format!("value of `{}` is too long", tag.key)));
        }
        if !TAG_PATTERN.is_match(&tag.key) || !TAG_PATTERN.is_match(&tag.value) {
            return Err(invalid(format!("`{}` contains disallowed characters", tag.key)));
        }
    }
    Ok(())
}

/// User metadata travels as HTTP headers and must be US-ASCII.
fn validate_metadata(key: &str, metadata: &HashMap<String, String>) -> StoreResult<()> {
    match metadata
        .iter()
        .find(|(name, value)| !name.is_ascii() || !value.is_ascii())
    {
        Some((name, _)) => Err(StoreError::InvalidMetadata {
            key: key.to_string(),
            reason: format!("`{}` is not US-ASCII", name),
        }),
        None => Ok(()),
    }
}

#[derive(Clone, Debug)]
struct MemoryObject {
    body: Bytes,
    content_type: String,
    metadata: HashMap<String, String>,
    tags: Vec<Tag>,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, MemoryObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Overwrite one metadata entry of an existing object.
    pub fn set_metadata(&self, key: &str, name: &str, value: &str) -> StoreResult<()> {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        object.metadata.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Drop one metadata entry of an existing object.
    pub fn remove_metadata(&self, key: &str, name: &str) -> StoreResult<()> {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        object.metadata.remove(name);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, request: PutObjectRequest) -> StoreResult<()> {
        if content_md5(&request.body) != request.content_md5 {
            return Err(StoreError::DigestMismatch(request.key));
        }
        validate_metadata(&request.key, &request.metadata)?;
        debug!(key = %request.key, size = request.body.len(), "memory put");
        let object = MemoryObject {
            body: request.body,
            content_type: request.content_type,
            metadata: request.metadata,
            tags: Vec::new(),
        };
        self.objects.write().insert(request.key, object);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<GetObjectOutput> {
        let object = self
            .objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let content_length = object.body.len() as i64;
        let body: BlobStream = Box::pin(stream::iter([Ok::<_, io::Error>(object.body)]));
        Ok(GetObjectOutput {
            metadata: object.metadata,
            content_type: Some(object.content_type),
            content_length,
            body,
        })
    }

    async fn list_keys(&self) -> StoreResult<Vec<ObjectSummary>> {
        Ok(self
            .objects
            .read()
            .iter()
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len() as i64,
            })
            .collect())
    }

    async fn set_tags(&self, key: &str, tags: Vec<Tag>) -> StoreResult<()> {
        validate_tags(key, &tags)?;
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        object.tags = tags;
        Ok(())
    }

    async fn get_tags(&self, key: &str) -> StoreResult<Vec<Tag>> {
        self.objects
            .read()
            .get(key)
            .map(|object| object.tags.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
