//! FileService: the validation layer the HTTP handlers talk to.
//!
//! Rejects empty filenames and malformed keys before the repository (and so
//! the backend) is touched, and generates the storage key for new uploads.

use crate::{
    models::file::{File, FileResponse, StoredFile},
    services::{
        file_repository::{FileRepository, RepositoryError},
        keys,
    },
};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FileServiceError {
    #[error("File name is required")]
    FileNameRequired,
    #[error("Empty or invalid key")]
    InvalidKey,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type FileServiceResult<T> = Result<T, FileServiceError>;

/// Cheap to clone; shared as router state.
#[derive(Clone)]
pub struct FileService {
    repo: Arc<dyn FileRepository>,
}

impl FileService {
    pub fn new(repo: Arc<dyn FileRepository>) -> Self {
        Self { repo }
    }

    /// Store an upload under a freshly generated key.
    pub async fn upload_file(
        &self,
        data: Bytes,
        file_name: &str,
    ) -> FileServiceResult<FileResponse> {
        if file_name.is_empty() {
            return Err(FileServiceError::FileNameRequired);
        }

        let id = keys::new_object_key();
        debug!(key = %id, file_name, size = data.len(), "uploading file");
        let access_token = self.repo.put_object(&id, data, file_name).await?;
        Ok(FileResponse { id, access_token })
    }

    /// Open a stored file by key.
    pub async fn get_file(&self, key: &str) -> FileServiceResult<StoredFile> {
        if key.is_empty() || !keys::is_valid_key(key) {
            return Err(FileServiceError::InvalidKey);
        }
        Ok(self.repo.get_object(key).await?)
    }

    /// All stored files.
    pub async fn get_files(&self) -> FileServiceResult<Vec<File>> {
        Ok(self.repo.list_objects().await?)
    }

    /// Probe the backend.
    pub async fn check_backend(&self) -> FileServiceResult<()> {
        Ok(self.repo.health_check().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::file_repository::RepositoryResult;
    use async_trait::async_trait;
    use futures::stream;
    use parking_lot::Mutex;

    /// Records every call; returns empty successes.
    #[derive(Default)]
    struct RecordingRepo {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRepo {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl FileRepository for RecordingRepo {
        async fn put_object(
            &self,
            key: &str,
            _data: Bytes,
            file_name: &str,
        ) -> RepositoryResult<String> {
            self.calls.lock().push(format!("put {key} {file_name}"));
            Ok("token".into())
        }

        async fn get_object(&self, key: &str) -> RepositoryResult<StoredFile> {
            self.calls.lock().push(format!("get {key}"));
            Ok(StoredFile {
                file: File {
                    id: key.into(),
                    name: String::new(),
                    size: 0,
                    content_type: None,
                },
                blob: Box::pin(stream::empty::<std::io::Result<Bytes>>()),
            })
        }

        async fn list_objects(&self) -> RepositoryResult<Vec<File>> {
            self.calls.lock().push("list".into());
            Ok(Vec::new())
        }

        async fn health_check(&self) -> RepositoryResult<()> {
            Ok(())
        }
    }

    fn service() -> (Arc<RecordingRepo>, FileService) {
        let repo = Arc::new(RecordingRepo::default());
        (repo.clone(), FileService::new(repo))
    }

    #[tokio::test]
    async fn get_file_empty_key_should_fail() {
        let (repo, svc) = service();
        let err = svc.get_file("").await.unwrap_err();
        assert_eq!(err.to_string(), "Empty or invalid key");
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn get_file_invalid_key_should_fail() {
        let (repo, svc) = service();
        let err = svc.get_file("2344").await.unwrap_err();
        assert_eq!(err.to_string(), "Empty or invalid key");
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn get_file_valid_key_should_pass() {
        let (repo, svc) = service();
        let key = "6d468b76-cf62-4b90-a238-bc0c4ace1648";
        let stored = svc.get_file(key).await.unwrap();
        assert_eq!(stored.file.id, key);
        assert_eq!(repo.calls(), vec![format!("get {key}")]);
    }

    #[tokio::test]
    async fn upload_without_name_should_fail() {
        let (repo, svc) = service();
        let err = svc.upload_file(Bytes::new(), "").await.unwrap_err();
        assert_eq!(err.to_string(), "File name is required");
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn upload_with_name_returns_generated_key() {
        let (repo, svc) = service();
        let resp = svc
            .upload_file(Bytes::from(vec![7u8; 1024]), "report.pdf")
            .await
            .unwrap();
        assert!(keys::is_valid_key(&resp.id));
        assert_eq!(resp.access_token, "token");
        assert_eq!(repo.calls(), vec![format!("put {} report.pdf", resp.id)]);
    }

    #[tokio::test]
    async fn get_files_delegates() {
        let (repo, svc) = service();
        assert!(svc.get_files().await.unwrap().is_empty());
        assert_eq!(repo.calls(), vec!["list".to_string()]);
    }
}
