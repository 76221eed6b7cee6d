//! Descriptive fields persisted alongside every stored file.
//!
//! The same three pairs are written twice: as object metadata (returned with
//! the body on download) and as the object's tag set (the only copy a bucket
//! listing can reach, one tag lookup per key).

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;

/// Original filename supplied at upload.
pub const FILE_NAME: &str = "file-name";

/// Random credential issued with the upload.
pub const ACCESS_TOKEN: &str = "access-token";

/// RFC 3339 instant after which the file is no longer served.
pub const ACCESS_TOKEN_EXPIRY: &str = "access-token-expry-date";

/// Prefix marking a filename stored in its base64 form.
const ENCODED_NAME_PREFIX: &str = "b64:";

/// Characters that survive both as an S3 tag value and as a US-ASCII
/// `x-amz-meta-*` header.
fn is_portable_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | ':' | '/' | '=' | '+' | '-' | '@')
}

/// Persisted form of a filename. Names made only of portable characters are
/// kept as they are; anything else is stored as `b64:<standard base64>`,
/// whose alphabet is itself portable.
pub fn encode_file_name(name: &str) -> String {
    if name.chars().all(is_portable_char) && !name.starts_with(ENCODED_NAME_PREFIX) {
        return name.to_string();
    }
    format!("{}{}", ENCODED_NAME_PREFIX, STANDARD.encode(name))
}

/// Inverse of [`encode_file_name`]. Values that do not decode are returned
/// unchanged.
pub fn decode_file_name(stored: &str) -> String {
    stored
        .strip_prefix(ENCODED_NAME_PREFIX)
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| stored.to_string())
}

/// A single tag on a stored object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Name, token and expiry recorded for one stored file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileAttributes {
    pub file_name: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl FileAttributes {
    /// Expiry rendered the way it is persisted (second precision, `Z` suffix).
    pub fn expiry_string(&self) -> String {
        self.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Object metadata map.
    pub fn to_metadata(&self) -> HashMap<String, String> {
        self.pairs().collect()
    }

    /// Object tag set.
    pub fn to_tags(&self) -> Vec<Tag> {
        self.pairs().map(|(k, v)| Tag::new(k, v)).collect()
    }

    fn pairs(&self) -> impl Iterator<Item = (String, String)> {
        [
            (FILE_NAME.to_string(), encode_file_name(&self.file_name)),
            (ACCESS_TOKEN.to_string(), self.access_token.clone()),
            (ACCESS_TOKEN_EXPIRY.to_string(), self.expiry_string()),
        ]
        .into_iter()
    }
}

/// Value of the tag named `key`, if present.
pub fn find_tag<'a>(tags: &'a [Tag], key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.key == key)
        .map(|tag| tag.value.as_str())
}
