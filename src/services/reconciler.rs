use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::api::error::AppError;
use crate::models::WorkflowStatus;
use crate::services::object_store::{EMPTY_FOLDER_PLACEHOLDER, ObjectStore};
use crate::services::status_table::StatusTable;

/// Outcome of one reconciliation run. `failed` counts individual inserts or
/// deletes that did not go through; the next run retries them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Restores the invariant between the object store and the status table:
/// every stored file has exactly one row, and no row points at a missing
/// blob. Blobs that arrived out-of-band get a fresh `ToDo` row; rows whose
/// blob is gone are removed.
pub struct Reconciler {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn StatusTable>,
    // Overlapping runs would race on the same snapshot and insert duplicate
    // rows, so runs are serialized process-wide.
    run_lock: Mutex<()>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ObjectStore>, table: Arc<dyn StatusTable>) -> Self {
        Self {
            store,
            table,
            run_lock: Mutex::new(()),
        }
    }

    /// One reconciliation pass. Both snapshots are taken up front; every
    /// mutation is computed from those snapshots and issued concurrently
    /// within its group. A failed read aborts with no mutations; a failed
    /// individual write is counted and left for the next run.
    pub async fn run(&self) -> Result<ReconcileReport, AppError> {
        let _guard = self.run_lock.lock().await;

        let objects = self
            .store
            .list()
            .await
            .map_err(|e| AppError::Fetch(format!("object store listing failed: {}", e)))?;
        let records = self
            .table
            .select_all()
            .await
            .map_err(|e| AppError::Fetch(format!("status table read failed: {}", e)))?;

        let blob_names: HashSet<&str> = objects
            .iter()
            .map(|o| o.name.as_str())
            .filter(|name| *name != EMPTY_FOLDER_PLACEHOLDER)
            .collect();
        let record_names: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();

        let mut report = ReconcileReport::default();

        // Blobs with no row: start them at the beginning of the workflow.
        let inserts = blob_names
            .difference(&record_names)
            .map(|name| {
                let table = Arc::clone(&self.table);
                let name = name.to_string();
                async move {
                    table
                        .insert(&name, WorkflowStatus::ToDo)
                        .await
                        .map(|_| name)
                }
            })
            .collect::<Vec<_>>();

        for result in join_all(inserts).await {
            match result {
                Ok(name) => {
                    tracing::debug!("Adopted stray blob into the table: {}", name);
                    report.inserted += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to insert status row: {}", e);
                    report.failed += 1;
                }
            }
        }

        // Rows whose blob is gone: stale, remove them.
        let deletes = records
            .iter()
            .filter(|r| !blob_names.contains(r.name.as_str()))
            .map(|r| {
                let table = Arc::clone(&self.table);
                let (id, name) = (r.id, r.name.clone());
                async move { table.delete(id).await.map(|_| name) }
            })
            .collect::<Vec<_>>();

        for result in join_all(deletes).await {
            match result {
                Ok(name) => {
                    tracing::debug!("Removed orphaned status row: {}", name);
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to delete status row: {}", e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            inserted = report.inserted,
            deleted = report.deleted,
            failed = report.failed,
            "Reconciliation finished"
        );

        Ok(report)
    }
}
