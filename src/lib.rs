//! HTTP front end for uploading, downloading and listing files kept in an
//! object-storage bucket.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
