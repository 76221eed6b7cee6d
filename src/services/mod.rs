//! Storage-facing services: the object store backends, the file repository
//! built on them, and the validating file service used by the handlers.

pub mod content_type;
pub mod file_repository;
pub mod file_service;
pub mod keys;
pub mod memory_store;
pub mod object_store;
pub mod s3_store;
