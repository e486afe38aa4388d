//! HTTP handlers for file history, transfer and hashing.
//! Object bodies are streamed out without buffering; uploads are read whole
//! since the digest must cover every byte before the write.

use crate::{
    errors::AppError,
    models::{
        api::{HashResponse, UploadResponse},
        stored_file::HistoryEntry,
    },
    services::{
        gateway_service::{DEFAULT_CONTENT_TYPE, FileUpload, GatewayService},
        object_store::ObjectBody,
    },
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use tracing::{error, info};

/// Multipart form field carrying the file.
const FILE_FIELD: &str = "file";

/// `GET /history` — every object, newest first.
pub async fn list_history(
    State(service): State<GatewayService>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    info!("fetching file history");
    let history = service.list_history().await.map_err(|err| {
        error!(error = %err, "error fetching file history");
        AppError::from(err)
    })?;
    info!(count = history.len(), "file history fetched");
    Ok(Json(history))
}

/// `GET /download/{file_name}` — stream an object as an attachment.
///
/// Every failure is reported as 404; the underlying cause is only logged.
pub async fn download_file(
    State(service): State<GatewayService>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    info!(%file_name, "attempting to download file");
    let object = service.download(&file_name).await.map_err(|err| {
        error!(%file_name, error = %err, "error downloading file");
        AppError::not_found("File not found")
    })?;

    let mut headers = HeaderMap::new();
    set_download_headers(&mut headers, &file_name, &object);

    let mut response = Response::new(Body::from_stream(object.stream));
    *response.status_mut() = StatusCode::OK;
    *response.headers_mut() = headers;
    Ok(response)
}

/// `POST /upload/` — store a multipart `file` and report its digest.
pub async fn upload_file(
    State(service): State<GatewayService>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_file_part(multipart).await.map_err(|err| {
        error!(error = %err, "error reading upload");
        err
    })?;
    let file_name = upload.file_name.clone();
    info!(%file_name, size = upload.content.len(), "starting upload");

    let response = service.upload(upload).await.map_err(|err| {
        error!(%file_name, error = %err, "error uploading file");
        AppError::from(err)
    })?;
    info!(file_url = %response.file_url, "file uploaded");
    Ok(Json(response))
}

/// `POST /calculate-hash` — digest a multipart `file` without storing it.
pub async fn calculate_hash(
    State(service): State<GatewayService>,
    multipart: Multipart,
) -> Result<Json<HashResponse>, AppError> {
    let upload = read_file_part(multipart).await.map_err(|err| {
        error!(error = %err, "error calculating file hash");
        err
    })?;
    let response = service.calculate_hash(&upload.file_name, &upload.content);
    info!(file_name = %response.file_name, hash = %response.hash, "calculated hash");
    Ok(Json(response))
}

/// Pull the first `file` part with a file name out of the form.
///
/// A missing part is a 400; a body that cannot be read is a 500.
async fn read_file_part(mut multipart: Multipart) -> Result<FileUpload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let content = field.bytes().await.map_err(read_error)?;

        return Ok(FileUpload {
            file_name,
            content,
            content_type,
        });
    }

    Err(AppError::bad_request("No file provided"))
}

fn read_error(err: MultipartError) -> AppError {
    AppError::internal(err.body_text())
}

fn set_download_headers(headers: &mut HeaderMap, file_name: &str, object: &ObjectBody) {
    let content_type = object
        .content_type
        .as_deref()
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );

    if let Some(length) = object.content_length.filter(|len| *len >= 0) {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    headers.insert(header::CONTENT_DISPOSITION, attachment_disposition(file_name));
}

fn attachment_disposition(file_name: &str) -> HeaderValue {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", escaped))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_quotes_file_name() {
        assert_eq!(
            attachment_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            attachment_disposition("say \"hi\".txt"),
            "attachment; filename=\"say \\\"hi\\\".txt\""
        );
    }

    #[test]
    fn disposition_drops_unrepresentable_names() {
        assert_eq!(attachment_disposition("bad\nname"), "attachment");
    }
}
