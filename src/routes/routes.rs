//! Defines routes for the file gateway.
//!
//! ## Structure
//! - **Probes**
//!   - `GET  /health` — liveness with timestamp
//!   - `GET  /readyz` — bucket reachability
//!
//! - **Files**
//!   - `GET  /history` — all objects, newest first
//!   - `GET  /download/{file_name}` — stream one object as an attachment
//!   - `POST /upload/` — multipart upload, digest stored as metadata
//!   - `POST /calculate-hash` — digest a multipart file without storing it
//!
//! - **Chain views**
//!   - `POST /verify` — find objects by digest
//!   - `GET  /blockchain-info` — block count and first listed object

use crate::{
    handlers::{
        chain_handlers::{blockchain_info, verify_file},
        file_handlers::{calculate_hash, download_file, list_history, upload_file},
        health_handlers::{health, readyz},
    },
    services::gateway_service::GatewayService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build and return the router for all gateway routes.
///
/// The router carries shared state (`GatewayService`) to all handlers.
pub fn routes() -> Router<GatewayService> {
    Router::new()
        // health endpoints
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        // file endpoints
        .route("/history", get(list_history))
        .route("/download/{file_name}", get(download_file))
        .route("/upload/", post(upload_file))
        .route("/upload", post(upload_file))
        .route("/calculate-hash", post(calculate_hash))
        // chain views
        .route("/verify", post(verify_file))
        .route("/blockchain-info", get(blockchain_info))
}

/// The complete application: routes plus CORS, request tracing and the
/// upload size limit, bound to `service`.
///
/// CORS is fully open (any origin, method and header).
pub fn app(service: GatewayService, max_upload_bytes: usize) -> Router {
    routes()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
