use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::{files, prelude::Files};
use crate::models::{FileRecord, WorkflowStatus};

/// The relational side of the system: one row per stored file.
#[async_trait]
pub trait StatusTable: Send + Sync {
    async fn select_all(&self) -> Result<Vec<FileRecord>>;

    /// Insert a new row; the table assigns the id.
    async fn insert(&self, name: &str, status: WorkflowStatus) -> Result<i32>;

    async fn update(&self, id: i32, status: WorkflowStatus) -> Result<()>;

    async fn delete(&self, id: i32) -> Result<()>;
}

/// sea-orm implementation over the `files` table
pub struct SeaOrmStatusTable {
    db: DatabaseConnection,
}

impl SeaOrmStatusTable {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StatusTable for SeaOrmStatusTable {
    async fn select_all(&self) -> Result<Vec<FileRecord>> {
        let rows = Files::find().all(&self.db).await?;
        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    async fn insert(&self, name: &str, status: WorkflowStatus) -> Result<i32> {
        let row = files::ActiveModel {
            name: Set(name.to_string()),
            status: Set(status),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(row.id)
    }

    async fn update(&self, id: i32, status: WorkflowStatus) -> Result<()> {
        files::ActiveModel {
            id: Set(id),
            status: Set(status),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<()> {
        Files::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
