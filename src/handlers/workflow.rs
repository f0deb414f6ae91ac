use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;
use crate::api::error::AppError;
use crate::models::WorkflowStatus;
use crate::models::view::{FileListView, FilePage, StatusChange};
use crate::services::reconciler::ReconcileReport;

#[derive(Serialize, ToSchema)]
pub struct StatusInfo {
    pub status: WorkflowStatus,
    pub label: String,
    pub progress: u8,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveStatusRequest {
    pub changes: Vec<StatusChange>,
}

#[derive(Serialize, ToSchema)]
pub struct SaveStatusResponse {
    pub updated: usize,
}

#[utoipa::path(
    get,
    path = "/files",
    params(FileListView),
    responses(
        (status = 200, description = "One page of the filtered file list", body = FilePage),
        (status = 502, description = "Status table read failed")
    ),
    tag = "workflow"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Query(view): Query<FileListView>,
) -> Result<Json<FilePage>, AppError> {
    let records = state.files.list_records().await?;
    Ok(Json(view.apply(&records, state.config.default_page_size)))
}

#[utoipa::path(
    get,
    path = "/workflow/statuses",
    responses(
        (status = 200, description = "The six workflow stages with their progress", body = [StatusInfo])
    ),
    tag = "workflow"
)]
pub async fn list_statuses() -> Json<Vec<StatusInfo>> {
    Json(
        WorkflowStatus::ALL
            .iter()
            .map(|s| StatusInfo {
                status: *s,
                label: s.label().to_string(),
                progress: s.progress(),
            })
            .collect(),
    )
}

#[utoipa::path(
    post,
    path = "/workflow/status",
    request_body = SaveStatusRequest,
    responses(
        (status = 200, description = "All staged changes applied", body = SaveStatusResponse),
        (status = 502, description = "Some updates failed; the rest are applied")
    ),
    tag = "workflow"
)]
pub async fn save_status_changes(
    State(state): State<AppState>,
    Json(req): Json<SaveStatusRequest>,
) -> Result<Json<SaveStatusResponse>, AppError> {
    let updated = state.files.apply_status_changes(&req.changes).await?;
    Ok(Json(SaveStatusResponse { updated }))
}

#[utoipa::path(
    post,
    path = "/workflow/reconcile",
    responses(
        (status = 200, description = "Reconciliation report", body = ReconcileReport),
        (status = 502, description = "A collaborator read failed; nothing was mutated")
    ),
    tag = "workflow"
)]
pub async fn run_reconciliation(
    State(state): State<AppState>,
) -> Result<Json<ReconcileReport>, AppError> {
    Ok(Json(state.reconciler.run().await?))
}
