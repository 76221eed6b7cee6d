//! Represents a file stored in the bucket.

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::{fmt, io, pin::Pin};

/// A boxed stream over a stored file's bytes.
pub type BlobStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Descriptive record of a stored file.
///
/// `content_type` is only known on download; listings leave it empty.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct File {
    /// Storage key (random identifier, independent of the filename).
    #[serde(rename = "ID")]
    pub id: String,

    /// Original filename supplied at upload.
    #[serde(rename = "Name")]
    pub name: String,

    /// Size in bytes.
    #[serde(rename = "Size")]
    pub size: i64,

    /// Content type detected from the bytes at upload.
    #[serde(
        rename = "ContentType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
}

/// A file opened for reading. Dropping it closes the underlying stream.
pub struct StoredFile {
    pub file: File,
    pub blob: BlobStream,
}

impl fmt::Debug for StoredFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredFile")
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

/// Returned to the uploader.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileResponse {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "AccessToken")]
    pub access_token: String,
}

/// Listing result, in the backend's listing order.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FileList {
    #[serde(rename = "Files")]
    pub files: Vec<File>,
}
