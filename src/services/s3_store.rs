//! S3-compatible object store using the AWS SDK.

use crate::{
    models::{file::BlobStream, metadata::Tag},
    services::object_store::{
        Encryption, GetObjectOutput, ObjectAcl, ObjectStore, ObjectSummary, PutObjectRequest,
        StoreError, StoreResult,
    },
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client,
    error::SdkError,
    primitives::ByteStream,
    types::{ObjectCannedAcl, ServerSideEncryption, Tagging},
};
use tokio_util::io::ReaderStream;
use tracing::instrument;

/// Connection settings for [`S3ObjectStore`].
#[derive(Clone, Debug)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, localstack).
    pub endpoint: Option<String>,
    /// Path-style addressing (`endpoint/bucket/key`), needed by most
    /// S3-compatible services.
    pub force_path_style: bool,
}

/// Bucket-backed object store.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3ObjectStore {
    /// Build a client from the ambient AWS configuration (credentials chain,
    /// profile) overridden by `settings`.
    pub async fn new(settings: &S3Settings) -> StoreResult<Self> {
        if settings.bucket.trim().is_empty() {
            return Err(StoreError::Config("bucket name is required".into()));
        }

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &settings.endpoint {
            // bare host:port endpoints get a scheme
            let lower = endpoint.to_ascii_lowercase();
            let url = if lower.starts_with("http://") || lower.starts_with("https://") {
                endpoint.clone()
            } else {
                format!("http://{}", endpoint)
            };
            builder = builder.endpoint_url(url);
        }
        if settings.force_path_style {
            builder = builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        })
    }
}

fn map_sdk_error<E>(err: SdkError<E>, key: &str) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    if let SdkError::ServiceError(ref service_err) = err
        && service_err.raw().status().as_u16() == 404
    {
        return StoreError::NotFound(key.to_string());
    }
    StoreError::Backend(Box::new(err))
}

fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
    match acl {
        ObjectAcl::Private => ObjectCannedAcl::Private,
    }
}

fn server_side_encryption(encryption: Encryption) -> ServerSideEncryption {
    match encryption {
        Encryption::Aes256 => ServerSideEncryption::Aes256,
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, request), fields(backend = "s3", key = %request.key, size = request.body.len()))]
    async fn put(&self, request: PutObjectRequest) -> StoreResult<()> {
        let content_length = request.body.len() as i64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&request.key)
            .body(ByteStream::from(request.body))
            .content_length(content_length)
            .content_type(request.content_type)
            .content_disposition(request.content_disposition)
            .content_md5(request.content_md5)
            .acl(canned_acl(request.acl))
            .server_side_encryption(server_side_encryption(request.encryption))
            .set_metadata(Some(request.metadata))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &request.key))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get(&self, key: &str) -> StoreResult<GetObjectOutput> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        let metadata = output.metadata().cloned().unwrap_or_default();
        let content_type = output.content_type().map(str::to_string);
        let content_length = output.content_length().unwrap_or(0);

        let body: BlobStream = Box::pin(ReaderStream::new(output.body.into_async_read()));
        Ok(GetObjectOutput {
            metadata,
            content_type,
            content_length,
            body,
        })
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn list_keys(&self) -> StoreResult<Vec<ObjectSummary>> {
        let mut results = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StoreError::Backend(Box::new(e)))?;
            for obj in page.contents() {
                if let Some(key) = obj.key() {
                    results.push(ObjectSummary {
                        key: key.to_string(),
                        size: obj.size().unwrap_or(0),
                    });
                }
            }
        }

        Ok(results)
    }

    #[instrument(skip(self, tags), fields(backend = "s3", tags = tags.len()))]
    async fn set_tags(&self, key: &str, tags: Vec<Tag>) -> StoreResult<()> {
        let tag_set = tags
            .into_iter()
            .map(|tag| {
                aws_sdk_s3::types::Tag::builder()
                    .key(tag.key)
                    .value(tag.value)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| StoreError::Backend(Box::new(e)))?;

        self.client
            .put_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .tagging(tagging)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get_tags(&self, key: &str) -> StoreResult<Vec<Tag>> {
        let output = self
            .client
            .get_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        Ok(output
            .tag_set()
            .iter()
            .map(|tag| Tag::new(tag.key(), tag.value()))
            .collect())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn health_check(&self) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &self.bucket))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
