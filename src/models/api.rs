//! Request and response bodies for the file endpoints.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Body of `POST /verify`. `file_name` is accepted but does not narrow the scan.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VerifyRequest {
    pub file_hash: String,
    pub file_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    pub message: String,
    pub file_url: String,
    pub file_name: String,
    pub file_hash: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HashResponse {
    pub file_name: String,
    pub hash: String,
}
