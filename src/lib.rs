pub mod api;
pub mod config;
pub mod entities;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::services::file_service::FileService;
use crate::services::reconciler::Reconciler;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::files::upload_files,
        handlers::files::list_objects,
        handlers::files::download_file,
        handlers::files::delete_file,
        handlers::files::bulk_delete,
        handlers::workflow::list_files,
        handlers::workflow::list_statuses,
        handlers::workflow::save_status_changes,
        handlers::workflow::run_reconciliation,
    ),
    components(
        schemas(
            handlers::files::UploadResponse,
            handlers::files::BulkDeleteRequest,
            handlers::files::BulkDeleteResponse,
            handlers::workflow::StatusInfo,
            handlers::workflow::SaveStatusRequest,
            handlers::workflow::SaveStatusResponse,
            models::WorkflowStatus,
            models::FileRecord,
            models::ObjectInfo,
            models::view::FilePage,
            models::view::StatusChange,
            models::view::SortColumn,
            models::view::SortOrder,
            services::file_service::FileUploadResult,
            services::reconciler::ReconcileReport,
        )
    ),
    tags(
        (name = "files", description = "Upload, download and delete invoice files"),
        (name = "workflow", description = "Status tracking and storage/table reconciliation")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub files: Arc<FileService>,
    pub reconciler: Arc<Reconciler>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/upload", post(handlers::files::upload_files))
        .route("/objects", get(handlers::files::list_objects))
        .route("/download/:name", get(handlers::files::download_file))
        .route("/files", get(handlers::workflow::list_files))
        .route("/files/:id", delete(handlers::files::delete_file))
        .route("/files/delete", post(handlers::files::bulk_delete))
        .route("/workflow/statuses", get(handlers::workflow::list_statuses))
        .route(
            "/workflow/status",
            post(handlers::workflow::save_status_changes),
        )
        .route(
            "/workflow/reconcile",
            post(handlers::workflow::run_reconciliation),
        )
        .with_state(state)
}
