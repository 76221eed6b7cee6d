//! HTTP handlers for uploading, downloading and listing files.
//! Download bodies are streamed straight from the store; all validation is
//! delegated to `FileService`.

use crate::{
    errors::AppError,
    handlers::pages,
    models::file::{File, FileList, FileResponse},
    services::file_service::FileService,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, Response},
};
use bytes::Bytes;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, info};

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// `GET /`
pub async fn home() -> Html<String> {
    Html(pages::home())
}

/// `GET /upload`: the upload form.
pub async fn upload_form() -> Html<String> {
    Html(pages::upload_form())
}

/// `POST /upload`: store the file and render the completion page.
pub async fn upload_page(
    State(service): State<FileService>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let (data, file_name) = read_upload(multipart).await?;
    let response = service.upload_file(data, &file_name).await?;
    info!(key = %response.id, file_name = %file_name, "upload complete");
    Ok(Html(pages::upload_complete(&response)))
}

/// `POST /api/upload`: store the file and answer with its key and token.
pub async fn upload_api(
    State(service): State<FileService>,
    multipart: Multipart,
) -> Result<Json<FileResponse>, AppError> {
    let (data, file_name) = read_upload(multipart).await?;
    let response = service.upload_file(data, &file_name).await?;
    info!(key = %response.id, file_name = %file_name, "upload complete");
    Ok(Json(response))
}

/// `GET /download/{key}` and `GET /api/download/{key}`: stream the file
/// back as an attachment under its original name.
pub async fn download(
    State(service): State<FileService>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let stored = service.get_file(&key).await?;
    debug!(key = %key, size = stored.file.size, "serving download");

    let mut response = Response::new(Body::from_stream(stored.blob));
    *response.status_mut() = StatusCode::OK;
    set_download_headers(response.headers_mut(), &stored.file);
    Ok(response)
}

/// `GET /list`: HTML table of stored files.
pub async fn list_page(State(service): State<FileService>) -> Result<Html<String>, AppError> {
    let files = service.get_files().await?;
    Ok(Html(pages::file_list(&FileList { files })))
}

/// `GET /api/list`: stored files as JSON.
pub async fn list_api(State(service): State<FileService>) -> Result<Json<Vec<File>>, AppError> {
    Ok(Json(service.get_files().await?))
}

/// Pull the `file` field out of a multipart body.
///
/// A missing filename is passed on as empty so the service reports it.
async fn read_upload(mut multipart: Multipart) -> Result<(Bytes, String), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::new(err.status(), err.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::new(err.status(), err.body_text()))?;
        return Ok((data, file_name));
    }
    Err(AppError::bad_request("multipart field `file` is required"))
}

fn set_download_headers(headers: &mut HeaderMap, file: &File) {
    let content_type = file
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.size.max(0)));
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(&file.name));
}

/// `attachment; filename="..."`, falling back to the RFC 5987 form for
/// names that cannot travel as a plain header value.
fn content_disposition(file_name: &str) -> HeaderValue {
    if file_name.is_ascii() {
        let quoted = file_name.replace('\\', "\\\\").replace('"', "\\\"");
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", quoted)) {
            return value;
        }
    }
    let encoded = utf8_percent_encode(file_name, NON_ALPHANUMERIC);
    HeaderValue::from_str(&format!("attachment; filename*=UTF-8''{}", encoded))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
