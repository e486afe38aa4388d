//! Health & readiness handlers.
//!
//! - GET /health  -> liveness with a timestamp, never touches the store
//! - GET /readyz  -> readiness that probes the backing bucket

use crate::{models::api::HealthResponse, services::gateway_service::GatewayService};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// `GET /health`
///
/// Always 200. Cheap enough for load-balancer polling.
pub async fn health() -> Json<HealthResponse> {
    info!("health check endpoint accessed");
    Json(HealthResponse {
        status: "healthy".into(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// `GET /readyz`
///
/// HTTP 200 when the bucket answers a probe with the configured credentials,
/// HTTP 503 otherwise.
pub async fn readyz(State(service): State<GatewayService>) -> impl IntoResponse {
    let store_check = match service.store().probe().await {
        Ok(()) => CheckStatus {
            ok: true,
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "store readiness probe failed");
            CheckStatus {
                ok: false,
                error: Some(e.to_string()),
            }
        }
    };

    let overall_ok = store_check.ok;
    let mut checks = HashMap::new();
    checks.insert("store", store_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
