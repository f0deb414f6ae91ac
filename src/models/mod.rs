pub mod view;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The six workflow stages an invoice moves through. Stored as snake_case
/// strings in the `files` table. Any stage may be set directly; there is no
/// enforced transition order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[sea_orm(string_value = "to_do")]
    ToDo,
    #[sea_orm(string_value = "to_approve")]
    ToApprove,
    #[sea_orm(string_value = "to_process")]
    ToProcess,
    #[sea_orm(string_value = "to_account")]
    ToAccount,
    #[sea_orm(string_value = "to_pay")]
    ToPay,
    #[sea_orm(string_value = "to_archive")]
    ToArchive,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 6] = [
        WorkflowStatus::ToDo,
        WorkflowStatus::ToApprove,
        WorkflowStatus::ToProcess,
        WorkflowStatus::ToAccount,
        WorkflowStatus::ToPay,
        WorkflowStatus::ToArchive,
    ];

    /// Completion percentage shown next to each file.
    pub fn progress(&self) -> u8 {
        match self {
            WorkflowStatus::ToDo => 0,
            WorkflowStatus::ToApprove => 20,
            WorkflowStatus::ToProcess => 40,
            WorkflowStatus::ToAccount => 60,
            WorkflowStatus::ToPay => 80,
            WorkflowStatus::ToArchive => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStatus::ToDo => "To Do",
            WorkflowStatus::ToApprove => "To Approve",
            WorkflowStatus::ToProcess => "To Process",
            WorkflowStatus::ToAccount => "To Account",
            WorkflowStatus::ToPay => "To Pay",
            WorkflowStatus::ToArchive => "To Archive",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A row of the status table, as exposed to handlers and collaborator traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileRecord {
    pub id: i32,
    pub name: String,
    pub status: WorkflowStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<crate::entities::files::Model> for FileRecord {
    fn from(m: crate::entities::files::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// A stored blob as reported by the object store listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ObjectInfo {
    pub name: String,
    pub size_bytes: i64,
    pub created_at: Option<DateTime<Utc>>,
}
