//! HTTP gateway that exposes an S3-compatible bucket as a list of files,
//! with MD5 digests and a read-time "blockchain" view of the listing.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
