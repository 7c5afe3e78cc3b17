//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{multipart::{MultipartError, MultipartRejection}, Multipart, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::UploadRequest;
use crate::web::dto::{ApiQuery, FileEntry, FilenameQuery, ListQuery, RenameRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Build a `Content-Disposition: attachment` value for a download.
///
/// Quotes, backslashes and control characters never reach the quoted
/// `filename` parameter. Names that needed that treatment, or that are not
/// ASCII, also get an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = filename
        .chars()
        .any(|c| !c.is_ascii() || c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{filename}\"");
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// Map a multipart read failure, keeping the 413 of an oversized body.
fn multipart_error(e: MultipartError, message: &str) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large()
    } else {
        tracing::warn!("{}: {}", message, e);
        ApiError::bad_request(message)
    }
}

fn required_filename(query: FilenameQuery) -> Result<String, ApiError> {
    query
        .filename
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("filename is required"))
}

/// GET /list - List the caller's files, most recent first.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let files = state
        .file_service()
        .list_files(&principal, query.limit)
        .await
        .map_err(|e| ApiError::from_error(e, "Error getting file list"))?;

    Ok(Json(files.into_iter().map(FileEntry::from).collect()))
}

/// POST /file - Upload a file.
///
/// Request body: multipart/form-data with a `file` part and a `filename`
/// field. Without the field, the `filename` query parameter is used, then
/// the part's own file name.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    ApiQuery(query): ApiQuery<FilenameQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(), ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("Rejected multipart request: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })?;
    let mut filename: Option<String> = None;
    let mut part_filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Invalid multipart data"))?
    {
        match field.name().unwrap_or("") {
            "filename" => {
                filename = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, "Invalid filename field"))?,
                );
            }
            "file" => {
                part_filename = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());
                content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, "Failed to read file"))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let filename = filename
        .filter(|name| !name.is_empty())
        .or(query.filename.filter(|name| !name.is_empty()))
        .or(part_filename)
        .ok_or_else(|| ApiError::bad_request("filename is required"))?;
    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;

    let mut request = UploadRequest::new(filename, content);
    if let Some(content_type) = content_type {
        request = request.with_content_type(content_type);
    }

    state
        .file_service()
        .upload(&principal, request)
        .await
        .map_err(|e| ApiError::from_error(e, "Error upload file"))?;

    Ok(())
}

/// GET /file?filename= - Download a file.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    ApiQuery(query): ApiQuery<FilenameQuery>,
) -> Result<Response<Body>, ApiError> {
    let filename = required_filename(query)?;

    let download = state
        .file_service()
        .download(&principal, &filename)
        .await
        .map_err(|e| ApiError::from_error(e, "Error download file"))?;

    Response::builder()
        .header(header::CONTENT_TYPE, download.file.content_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.file.filename),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Error download file")
        })
}

/// DELETE /file?filename= - Delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    ApiQuery(query): ApiQuery<FilenameQuery>,
) -> Result<(), ApiError> {
    let filename = required_filename(query)?;

    state
        .file_service()
        .delete(&principal, &filename)
        .await
        .map_err(|e| ApiError::from_error(e, "Error delete file"))
}

/// PUT /file?filename= - Rename a file.
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    ApiQuery(query): ApiQuery<FilenameQuery>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<(), ApiError> {
    let filename = required_filename(query)?;

    state
        .file_service()
        .rename(&principal, &filename, &req.name)
        .await
        .map_err(|e| ApiError::from_error(e, "Error rename file"))?;

    Ok(())
}
