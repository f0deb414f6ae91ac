use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::models::view::{PendingChanges, Selection, StatusChange};
use crate::models::{FileRecord, ObjectInfo, WorkflowStatus};
use crate::services::object_store::{EMPTY_FOLDER_PLACEHOLDER, ObjectStore};
use crate::services::status_table::StatusTable;
use crate::utils::validation::{sanitize_filename, validate_upload};

/// Per-file outcome of a multi-file upload. A failing file never affects
/// its siblings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileUploadResult {
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct FileService {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn StatusTable>,
    config: AppConfig,
}

impl FileService {
    pub fn new(store: Arc<dyn ObjectStore>, table: Arc<dyn StatusTable>, config: AppConfig) -> Self {
        Self {
            store,
            table,
            config,
        }
    }

    pub async fn list_records(&self) -> Result<Vec<FileRecord>, AppError> {
        self.table
            .select_all()
            .await
            .map_err(|e| AppError::Fetch(format!("status table read failed: {}", e)))
    }

    /// Raw storage listing, placeholder entries excluded.
    pub async fn list_objects(&self) -> Result<Vec<ObjectInfo>, AppError> {
        let objects = self
            .store
            .list()
            .await
            .map_err(|e| AppError::Fetch(format!("object store listing failed: {}", e)))?;
        Ok(objects
            .into_iter()
            .filter(|o| o.name != EMPTY_FOLDER_PLACEHOLDER)
            .collect())
    }

    /// Upload a batch of files concurrently. Each file is validated, pushed
    /// to storage, then given a `ToDo` row.
    pub async fn upload_many(
        &self,
        files: Vec<(String, Option<String>, Bytes)>,
    ) -> Result<Vec<FileUploadResult>, AppError> {
        if files.is_empty() {
            return Err(AppError::Validation("no file provided".to_string()));
        }

        let uploads = files
            .into_iter()
            .map(|(name, content_type, data)| self.upload_one(name, content_type, data));

        Ok(join_all(uploads).await)
    }

    async fn upload_one(
        &self,
        raw_name: String,
        content_type: Option<String>,
        data: Bytes,
    ) -> FileUploadResult {
        let name = match sanitize_filename(&raw_name) {
            Ok(name) => name,
            Err(e) => {
                return FileUploadResult {
                    name: raw_name,
                    ok: false,
                    error: Some(e.to_string()),
                };
            }
        };

        if let Err(e) = validate_upload(
            &name,
            content_type.as_deref(),
            data.len(),
            &data,
            self.config.max_file_size,
        ) {
            return FileUploadResult {
                name,
                ok: false,
                error: Some(e.to_string()),
            };
        }

        if let Err(e) = self.store.upload(&name, data).await {
            tracing::error!("Upload to storage failed for {}: {}", name, e);
            return FileUploadResult {
                name,
                ok: false,
                error: Some(format!("storage upload failed: {}", e)),
            };
        }

        // The blob is in place at this point. If the row insert fails the
        // next reconciliation run adopts the blob, so the file is not lost.
        if let Err(e) = self.table.insert(&name, WorkflowStatus::ToDo).await {
            tracing::error!("Status row insert failed for {}: {}", name, e);
            return FileUploadResult {
                name,
                ok: false,
                error: Some(format!("status row insert failed: {}", e)),
            };
        }

        tracing::info!("Uploaded {}", name);
        FileUploadResult {
            name,
            ok: true,
            error: None,
        }
    }

    pub async fn download(&self, raw_name: &str) -> Result<(String, Bytes), AppError> {
        let name = sanitize_filename(raw_name).map_err(|e| AppError::Validation(e.to_string()))?;
        let data = self
            .store
            .download(&name)
            .await
            .map_err(|e| AppError::NotFound(format!("download failed for {}: {}", name, e)))?;
        Ok((name, data))
    }

    /// Delete one file by its row id: the blob goes first, then the row.
    pub async fn delete_record(&self, id: i32) -> Result<(), AppError> {
        let records = self.list_records().await?;
        let record = records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("no file with id {}", id)))?;

        self.store
            .remove(&[record.name.clone()])
            .await
            .map_err(|e| AppError::Write(format!("blob removal failed: {}", e)))?;

        self.table
            .delete(id)
            .await
            .map_err(|e| AppError::Write(format!("status row delete failed: {}", e)))?;

        tracing::info!("Deleted {}", record.name);
        Ok(())
    }

    /// Bulk delete by name. Only storage is touched; the orphaned rows are
    /// reaped by the next reconciliation run.
    pub async fn delete_objects(&self, names: &[String]) -> Result<usize, AppError> {
        let selection = Selection::from_names(names.iter().cloned());
        if selection.is_empty() {
            return Err(AppError::Validation(
                "select at least one file to delete".to_string(),
            ));
        }

        let names = selection.names();
        self.store
            .remove(&names)
            .await
            .map_err(|e| AppError::Write(format!("bulk removal failed: {}", e)))?;

        tracing::info!("Removed {} object(s) from storage", names.len());
        Ok(names.len())
    }

    /// Apply a batch of status changes, one update per row, all issued
    /// concurrently. Duplicated ids collapse to the last change. Partial
    /// failure leaves the successful updates in place and is surfaced as a
    /// write error.
    pub async fn apply_status_changes(
        &self,
        changes: &[StatusChange],
    ) -> Result<usize, AppError> {
        let batch = changes
            .iter()
            .fold(PendingChanges::default(), |batch, c| {
                batch.stage(c.id, c.status)
            });

        if batch.is_empty() {
            return Ok(0);
        }

        let total = batch.len();
        let updates = batch.changes().iter().map(|c| {
            let table = Arc::clone(&self.table);
            let (id, status) = (c.id, c.status);
            async move { table.update(id, status).await.map_err(|e| (id, e)) }
        });

        let mut failed = 0usize;
        for result in join_all(updates).await {
            if let Err((id, e)) = result {
                tracing::warn!("Status update failed for id {}: {}", id, e);
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(AppError::Write(format!(
                "{} of {} status updates failed",
                failed, total
            )));
        }
        Ok(total)
    }
}
