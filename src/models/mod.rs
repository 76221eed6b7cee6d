//! Data models for the file service.
//!
//! `File` is the record handed to clients; `metadata` holds the fields that
//! are persisted next to each stored blob.

pub mod file;
pub mod metadata;
