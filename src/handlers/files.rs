use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;
use crate::api::error::AppError;
use crate::models::ObjectInfo;
use crate::services::file_service::FileUploadResult;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub uploaded: usize,
    pub results: Vec<FileUploadResult>,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub names: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: usize,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = String, content_type = "multipart/form-data", description = "One or more PDF files under 'file' fields"),
    responses(
        (status = 200, description = "Per-file upload results", body = UploadResponse),
        (status = 400, description = "No file provided or malformed multipart body")
    ),
    tag = "files"
)]
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {}", e)))?;
        files.push((filename, content_type, data));
    }

    let results = state.files.upload_many(files).await?;
    let uploaded = results.iter().filter(|r| r.ok).count();
    Ok(Json(UploadResponse { uploaded, results }))
}

#[utoipa::path(
    get,
    path = "/objects",
    responses(
        (status = 200, description = "Objects currently in storage", body = [ObjectInfo]),
        (status = 502, description = "Object store listing failed")
    ),
    tag = "files"
)]
pub async fn list_objects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ObjectInfo>>, AppError> {
    Ok(Json(state.files.list_objects().await?))
}

#[utoipa::path(
    get,
    path = "/download/{name}",
    params(("name" = String, Path, description = "File name")),
    responses(
        (status = 200, description = "The file content", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "No such object")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let (name, data) = state.files.download(&name).await?;

    let encoded = utf8_percent_encode(&name, NON_ALPHANUMERIC);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime::APPLICATION_PDF.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename*=UTF-8''{}", encoded),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    params(("id" = i32, Path, description = "Status row id")),
    responses(
        (status = 204, description = "Blob and row deleted"),
        (status = 404, description = "No file with that id")
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.files.delete_record(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/files/delete",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Objects removed from storage", body = BulkDeleteResponse),
        (status = 400, description = "Empty selection")
    ),
    tag = "files"
)]
pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let deleted = state.files.delete_objects(&req.names).await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}
