//! File repository: turns bytes plus a filename into a stored, tagged,
//! access-limited object, and turns a key back into a byte stream with the
//! metadata it was stored with.
//!
//! Every stored object carries its original filename, an access token and
//! the token's expiry twice: once as object metadata (read back on download)
//! and once as the tag set (the only copy reachable from a listing, which is
//! why listing costs one extra round trip per object).

use crate::{
    models::{
        file::{File, StoredFile},
        metadata::{self, FileAttributes},
    },
    services::{
        content_type,
        keys::{self, new_access_token},
        object_store::{
            Encryption, ObjectAcl, ObjectStore, PutObjectRequest, StoreError, content_md5,
        },
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Access tokens are valid for a week unless configured otherwise.
pub const DEFAULT_ACCESS_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error("file `{0}` not found")]
    NotFound(String),
    #[error("Access time expired")]
    AccessExpired { key: String, expired_at: DateTime<Utc> },
    #[error("invalid access token expiry for `{key}`: {reason}")]
    InvalidExpiry { key: String, reason: String },
    #[error("access token lifetime {ttl} is out of range")]
    ExpiryOutOfRange { ttl: Duration },
    #[error("tagging `{key}` failed: {source}")]
    Tagging {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait FileRepository: Send + Sync + 'static {
    /// Store `data` under `key` and return the access token issued for it.
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        file_name: &str,
    ) -> RepositoryResult<String>;

    /// Open the file stored under `key`, refusing it once its access token
    /// has expired.
    async fn get_object(&self, key: &str) -> RepositoryResult<StoredFile>;

    /// Every stored file, names recovered from tags.
    async fn list_objects(&self) -> RepositoryResult<Vec<File>>;

    /// Backend reachability probe.
    async fn health_check(&self) -> RepositoryResult<()>;
}

/// The production repository, backed by any [`ObjectStore`].
#[derive(Clone)]
pub struct ObjectStoreRepository {
    store: Arc<dyn ObjectStore>,
    access_token_ttl: Duration,
}

impl ObjectStoreRepository {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_ttl(store, Duration::days(DEFAULT_ACCESS_TOKEN_TTL_DAYS))
    }

    pub fn with_ttl(store: Arc<dyn ObjectStore>, access_token_ttl: Duration) -> Self {
        Self {
            store,
            access_token_ttl,
        }
    }

    /// Parse and enforce the stored expiry.
    fn check_expiry(
        key: &str,
        stored: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let raw = stored.get(metadata::ACCESS_TOKEN_EXPIRY).ok_or_else(|| {
            RepositoryError::InvalidExpiry {
                key: key.to_string(),
                reason: "missing".into(),
            }
        })?;
        let expires_at = DateTime::parse_from_rfc3339(raw)
            .map_err(|err| RepositoryError::InvalidExpiry {
                key: key.to_string(),
                reason: err.to_string(),
            })?
            .with_timezone(&Utc);

        if now > expires_at {
            return Err(RepositoryError::AccessExpired {
                key: key.to_string(),
                expired_at: expires_at,
            });
        }
        Ok(())
    }

    /// Remove a blob whose tags could not be written. The failure is still
    /// reported to the caller; this only avoids leaving an untagged object.
    async fn discard_orphan(&self, key: &str) {
        match self.store.delete(key).await {
            Ok(()) => warn!(key, "removed untagged object after tagging failure"),
            Err(err) => error!(
                key,
                error = %err,
                "untagged object left in bucket after tagging failure"
            ),
        }
    }
}

#[async_trait]
impl FileRepository for ObjectStoreRepository {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        file_name: &str,
    ) -> RepositoryResult<String> {
        let expires_at = Utc::now()
            .checked_add_signed(self.access_token_ttl)
            .ok_or(RepositoryError::ExpiryOutOfRange {
                ttl: self.access_token_ttl,
            })?;
        let attributes = FileAttributes {
            file_name: file_name.to_string(),
            access_token: new_access_token(),
            expires_at,
        };

        let request = PutObjectRequest {
            key: key.to_string(),
            content_type: content_type::detect(&data).to_string(),
            content_disposition: "attachment".into(),
            content_md5: content_md5(&data),
            metadata: attributes.to_metadata(),
            acl: ObjectAcl::Private,
            encryption: Encryption::Aes256,
            body: data,
        };
        debug!(?request, "storing object");
        self.store.put(request).await?;

        if let Err(source) = self.store.set_tags(key, attributes.to_tags()).await {
            error!(key, error = %source, "object stored but tagging failed");
            self.discard_orphan(key).await;
            return Err(RepositoryError::Tagging {
                key: key.to_string(),
                source,
            });
        }

        info!(key, file_name, expires_at = %attributes.expiry_string(), "stored file");
        Ok(attributes.access_token)
    }

    async fn get_object(&self, key: &str) -> RepositoryResult<StoredFile> {
        if !keys::is_valid_key(key) {
            return Err(RepositoryError::InvalidKey(key.to_string()));
        }

        let output = self.store.get(key).await.map_err(|err| match err {
            StoreError::NotFound(key) => RepositoryError::NotFound(key),
            other => RepositoryError::Store(other),
        })?;

        Self::check_expiry(key, &output.metadata, Utc::now())?;

        let file = File {
            id: key.to_string(),
            name: output
                .metadata
                .get(metadata::FILE_NAME)
                .map(|stored| metadata::decode_file_name(stored))
                .unwrap_or_default(),
            size: output.content_length,
            content_type: output.content_type,
        };
        Ok(StoredFile {
            file,
            blob: output.body,
        })
    }

    async fn list_objects(&self) -> RepositoryResult<Vec<File>> {
        let summaries = self.store.list_keys().await?;
        let mut files = Vec::with_capacity(summaries.len());

        // one tag lookup per object: listings carry neither metadata nor tags
        for summary in summaries {
            let tags = match self.store.get_tags(&summary.key).await {
                Ok(tags) => tags,
                // removed since the listing was taken
                Err(StoreError::NotFound(_)) => {
                    debug!(key = %summary.key, "object vanished during listing");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            files.push(File {
                name: metadata::find_tag(&tags, metadata::FILE_NAME)
                    .map(metadata::decode_file_name)
                    .unwrap_or_default(),
                id: summary.key,
                size: summary.size,
                content_type: None,
            });
        }

        debug!(count = files.len(), "listed files");
        Ok(files)
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        self.store.health_check().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::InMemoryObjectStore;
    use chrono::SecondsFormat;
    use futures::TryStreamExt;

    const KEY: &str = "6d468b76-cf62-4b90-a238-bc0c4ace1648";

    fn repo() -> (Arc<InMemoryObjectStore>, ObjectStoreRepository) {
        let store = Arc::new(InMemoryObjectStore::new());
        let repo = ObjectStoreRepository::new(store.clone());
        (store, repo)
    }

    async fn read_all(stored: StoredFile) -> Vec<u8> {
        let chunks: Vec<Bytes> = stored.blob.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn put_then_get_round_trips_bytes_and_metadata() {
        let (_, repo) = repo();
        let token = repo
            .put_object(KEY, Bytes::from_static(b"%PDF-1.4 body"), "report.pdf")
            .await
            .unwrap();
        assert!(keys::is_valid_key(&token));

        let stored = repo.get_object(KEY).await.unwrap();
        assert_eq!(stored.file.id, KEY);
        assert_eq!(stored.file.name, "report.pdf");
        assert_eq!(stored.file.size, 13);
        assert_eq!(stored.file.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(read_all(stored).await, b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn put_writes_metadata_and_tags_alike() {
        let (store, repo) = repo();
        let before = Utc::now();
        let token = repo
            .put_object(KEY, Bytes::new(), "empty.txt")
            .await
            .unwrap();

        let tags = store.get_tags(KEY).await.unwrap();
        assert_eq!(metadata::find_tag(&tags, metadata::FILE_NAME), Some("empty.txt"));
        assert_eq!(
            metadata::find_tag(&tags, metadata::ACCESS_TOKEN),
            Some(token.as_str())
        );

        let output = store.get(KEY).await.unwrap();
        assert_eq!(output.content_type.as_deref(), Some(content_type::TEXT_PLAIN));
        for tag in &tags {
            assert_eq!(output.metadata.get(&tag.key), Some(&tag.value));
        }

        let expiry = DateTime::parse_from_rfc3339(
            metadata::find_tag(&tags, metadata::ACCESS_TOKEN_EXPIRY).unwrap(),
        )
        .unwrap()
        .with_timezone(&Utc);
        let ttl = expiry - before;
        assert!(ttl > Duration::days(7) - Duration::seconds(5));
        assert!(ttl <= Duration::days(7) + Duration::seconds(1));
    }

    #[tokio::test]
    async fn each_upload_issues_a_fresh_token() {
        let (_, repo) = repo();
        let a = repo.put_object(KEY, Bytes::new(), "a").await.unwrap();
        let b = repo
            .put_object("9a2b6f4e-1c3d-4e5f-8a7b-0c1d2e3f4a5b", Bytes::new(), "a")
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn expired_object_is_refused_but_still_stored() {
        let (store, repo) = repo();
        repo.put_object(KEY, Bytes::from_static(b"data"), "a.txt")
            .await
            .unwrap();
        let past = (Utc::now() - Duration::minutes(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
        store
            .set_metadata(KEY, metadata::ACCESS_TOKEN_EXPIRY, &past)
            .unwrap();

        let err = repo.get_object(KEY).await.unwrap_err();
        assert!(matches!(err, RepositoryError::AccessExpired { .. }));
        assert_eq!(err.to_string(), "Access time expired");
        assert!(store.get(KEY).await.is_ok());
    }

    #[tokio::test]
    async fn negative_ttl_expires_immediately() {
        let store = Arc::new(InMemoryObjectStore::new());
        let repo = ObjectStoreRepository::with_ttl(store, Duration::seconds(-1));
        repo.put_object(KEY, Bytes::new(), "a").await.unwrap();
        assert!(matches!(
            repo.get_object(KEY).await,
            Err(RepositoryError::AccessExpired { .. })
        ));
    }

    #[tokio::test]
    async fn missing_expiry_is_a_hard_failure() {
        let (store, repo) = repo();
        repo.put_object(KEY, Bytes::new(), "a").await.unwrap();
        store
            .remove_metadata(KEY, metadata::ACCESS_TOKEN_EXPIRY)
            .unwrap();
        match repo.get_object(KEY).await {
            Err(RepositoryError::InvalidExpiry { reason, .. }) => assert_eq!(reason, "missing"),
            other => panic!("expected InvalidExpiry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_ttl_is_an_error_not_a_panic() {
        let store = Arc::new(InMemoryObjectStore::new());
        let repo = ObjectStoreRepository::with_ttl(store.clone(), Duration::MAX);
        assert!(matches!(
            repo.put_object(KEY, Bytes::new(), "a").await,
            Err(RepositoryError::ExpiryOutOfRange { .. })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn names_outside_the_tag_alphabet_round_trip() {
        let (_, repo) = repo();
        let names = [
            ("6d468b76-cf62-4b90-a238-bc0c4ace1648", "report (1).pdf"),
            ("9a2b6f4e-1c3d-4e5f-8a7b-0c1d2e3f4a5b", "o'brien, résumé & co.txt"),
        ];
        for (key, name) in names {
            repo.put_object(key, Bytes::from_static(b"x"), name)
                .await
                .unwrap();
            assert_eq!(repo.get_object(key).await.unwrap().file.name, name);
        }

        let mut listed: Vec<String> = repo
            .list_objects()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        listed.sort();
        assert_eq!(listed, ["o'brien, résumé & co.txt", "report (1).pdf"]);
    }

    #[tokio::test]
    async fn corrupt_expiry_is_a_hard_failure() {
        let (store, repo) = repo();
        repo.put_object(KEY, Bytes::new(), "a").await.unwrap();
        store
            .set_metadata(KEY, metadata::ACCESS_TOKEN_EXPIRY, "next tuesday")
            .unwrap();
        assert!(matches!(
            repo.get_object(KEY).await,
            Err(RepositoryError::InvalidExpiry { .. })
        ));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let (_, repo) = repo();
        assert!(matches!(
            repo.get_object(KEY).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn malformed_key_is_rejected() {
        let (_, repo) = repo();
        assert!(matches!(
            repo.get_object("2344").await,
            Err(RepositoryError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn list_recovers_names_from_tags() {
        let (_, repo) = repo();
        assert!(repo.list_objects().await.unwrap().is_empty());

        repo.put_object(KEY, Bytes::from_static(b"abc"), "first.txt")
            .await
            .unwrap();
        let files = repo.list_objects().await.unwrap();
        assert_eq!(
            files,
            vec![File {
                id: KEY.into(),
                name: "first.txt".into(),
                size: 3,
                content_type: None,
            }]
        );
    }
}
