//! HTTP handlers for the read-time "blockchain" views.

use crate::{
    errors::AppError,
    models::{
        api::VerifyRequest,
        chain::{BlockchainInfo, ChainEntry},
    },
    services::gateway_service::GatewayService,
};
use axum::{Json, extract::State};
use tracing::{error, info};

/// `POST /verify` — find every object whose stored digest equals `file_hash`.
pub async fn verify_file(
    State(service): State<GatewayService>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<Vec<ChainEntry>>, AppError> {
    info!(file_hash = %request.file_hash, file_name = %request.file_name, "verifying file");
    let matches = service.verify(&request).await.map_err(|err| {
        error!(file_hash = %request.file_hash, error = %err, "error verifying file");
        AppError::from(err)
    })?;
    info!(matches = matches.len(), "file verification completed");
    Ok(Json(matches))
}

/// `GET /blockchain-info`
pub async fn blockchain_info(
    State(service): State<GatewayService>,
) -> Result<Json<BlockchainInfo>, AppError> {
    info!("fetching blockchain info");
    let info = service.blockchain_info().await.map_err(|err| {
        error!(error = %err, "error fetching blockchain info");
        AppError::from(err)
    })?;
    info!(total_blocks = info.total_blocks, "blockchain info fetched");
    Ok(Json(info))
}
