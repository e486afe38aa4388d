//! Data models for the gateway.
//!
//! `StoredFile` is the domain view of one object in the store; the remaining
//! types are the JSON shapes exchanged with HTTP clients.

pub mod api;
pub mod chain;
pub mod stored_file;

use chrono::{DateTime, Utc};

/// Render a store timestamp the way every endpoint reports it (RFC 3339, `+00:00` offset).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}
