//! File upload, listing and download handlers.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use futures::StreamExt;
use std::sync::Arc;

use crate::file::{FileRepository, UploadRequest};
use crate::web::dto::{FileInfoResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Allowance for multipart framing and small form fields on top of the file.
///
/// Bounds the whole request body; requests carrying more than this in other
/// fields are cut off by the body limit.
pub const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// Create a Content-Disposition header value with proper encoding.
///
/// Uses RFC 5987 encoding for non-ASCII filenames to prevent header injection
/// and support international characters.
pub fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{}\"", filename);
    }

    // ASCII fallback for clients without filename* support
    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// Size the client declared for the file part itself.
///
/// Only the part's own Content-Length counts; the request's length also
/// covers other fields. The ceiling is enforced while streaming either way.
fn declared_size(part_headers: &HeaderMap) -> Option<u64> {
    part_headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

/// POST /api/upload - Upload a file (multipart field `file`).
pub async fn upload(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_input(format!("Invalid multipart data: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let hint = declared_size(field.headers());
        let stream = Box::pin(field.map(|chunk| {
            chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
        }));

        let receipt = state
            .uploads
            .upload(UploadRequest {
                identity,
                filename,
                size_hint: hint,
                stream,
            })
            .await?;

        return Ok(Json(receipt.into()));
    }

    Err(ApiError::invalid_input("No file provided"))
}

/// GET /api/files - List the caller's files, newest first.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<FileInfoResponse>>, ApiError> {
    let records = FileRepository::new(state.db.pool())
        .list_by_owner(identity.user_id)
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// GET /api/files/:share_id - File metadata by share id.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(share_id): Path<String>,
) -> Result<Json<FileInfoResponse>, ApiError> {
    let record = state.downloads.resolve_by_share_id(&share_id).await?;
    Ok(Json(record.into()))
}

/// GET /api/download/:share_id - Stream file content.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(share_id): Path<String>,
) -> Result<Response, ApiError> {
    let opened = state.downloads.download(&share_id).await?;

    let content_type = mime_guess::from_path(&opened.filename)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&opened.filename),
        )
        .header(header::CONTENT_LENGTH, opened.size)
        .body(Body::from_stream(opened.stream))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}
