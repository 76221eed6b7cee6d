//! Random identifiers for stored files and their access tokens.
//!
//! Both storage keys and access tokens are random (version 4) UUIDs rendered
//! in their canonical hyphenated lowercase form. Keys are never derived from
//! a filename or the file content.

use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

/// Canonical textual form of a random UUID: version digit `4`, variant
/// nibble `8`, `9`, `a` or `b`.
static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-f0-9]{8}-[a-f0-9]{4}-4[a-f0-9]{3}-[89abAB][a-f0-9]{3}-[a-f0-9]{12}$")
        .expect("key pattern is a valid regex")
});

/// Generate a fresh storage key.
pub fn new_object_key() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a fresh access token.
pub fn new_access_token() -> String {
    Uuid::new_v4().to_string()
}

/// True when `key` is a well-formed storage key.
///
/// Anything else (empty, truncated, wrong grouping, wrong version or variant
/// digit) must be rejected before the backend is contacted.
pub fn is_valid_key(key: &str) -> bool {
    KEY_PATTERN.is_match(key)
}
