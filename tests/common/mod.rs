#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use file_web::{
    models::metadata::Tag,
    routes::routes::build_router,
    services::{
        file_repository::ObjectStoreRepository,
        file_service::FileService,
        memory_store::InMemoryObjectStore,
        object_store::{
            GetObjectOutput, ObjectStore, ObjectSummary, PutObjectRequest, StoreError, StoreResult,
        },
    },
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

pub const BOUNDARY: &str = "----file-web-test-boundary";

/// In-memory store with switchable failures and a write counter.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryObjectStore,
    pub fail_tagging: AtomicBool,
    pub fail_backend: AtomicBool,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
    /// Extra listing entries whose objects no longer exist.
    pub vanished: Mutex<Vec<ObjectSummary>>,
}

impl FaultyStore {
    fn check_backend(&self) -> StoreResult<()> {
        if self.fail_backend.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put(&self, request: PutObjectRequest) -> StoreResult<()> {
        self.check_backend()?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(request).await
    }

    async fn get(&self, key: &str) -> StoreResult<GetObjectOutput> {
        self.check_backend()?;
        self.inner.get(key).await
    }

    async fn list_keys(&self) -> StoreResult<Vec<ObjectSummary>> {
        self.check_backend()?;
        let mut keys = self.inner.list_keys().await?;
        keys.extend(self.vanished.lock().iter().cloned());
        Ok(keys)
    }

    async fn set_tags(&self, key: &str, tags: Vec<Tag>) -> StoreResult<()> {
        self.check_backend()?;
        if self.fail_tagging.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("tag limit exceeded".into()));
        }
        self.inner.set_tags(key, tags).await
    }

    async fn get_tags(&self, key: &str) -> StoreResult<Vec<Tag>> {
        self.check_backend()?;
        self.inner.get_tags(key).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check_backend()
    }

    fn backend_name(&self) -> &'static str {
        "faulty-memory"
    }
}

/// Full application over a fresh `FaultyStore`.
pub fn app() -> (Arc<FaultyStore>, Router) {
    app_with_limit(1024 * 1024)
}

pub fn app_with_limit(max_upload_bytes: usize) -> (Arc<FaultyStore>, Router) {
    let store = Arc::new(FaultyStore::default());
    let repo = ObjectStoreRepository::new(store.clone());
    let service = FileService::new(Arc::new(repo));
    (store, build_router(service, max_upload_bytes))
}

/// A multipart body with a single `file` field.
pub fn multipart_body(file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A multipart body whose only field is not `file`.
pub fn multipart_without_file() -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"comment\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    )
    .into_bytes()
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
