//! View-local state for the file list: search/filter/sort/pagination, the
//! selection set of the delete page, and the pending status-change batch of
//! the workflow page. All of it is immutable data transformed by pure
//! functions; nothing in this module talks to a collaborator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{FileRecord, WorkflowStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Name,
    Status,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query state of the file list. Parsed straight from query parameters;
/// `apply` is a pure function over an already-fetched record set.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileListView {
    /// Case-insensitive substring match on the file name.
    pub search: Option<String>,
    /// Exact status filter.
    pub status: Option<WorkflowStatus>,
    pub sort_by: Option<SortColumn>,
    #[serde(default)]
    pub order: SortOrder,
    /// 1-based page number.
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// One page of the filtered list, plus the totals the pager needs.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FilePage {
    pub items: Vec<FileRecord>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

impl FileListView {
    pub fn apply(&self, records: &[FileRecord], default_per_page: usize) -> FilePage {
        let needle = self
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty());

        let mut filtered: Vec<FileRecord> = records
            .iter()
            .filter(|r| match &needle {
                Some(n) => r.name.to_lowercase().contains(n),
                None => true,
            })
            .filter(|r| match self.status {
                Some(s) => r.status == s,
                None => true,
            })
            .cloned()
            .collect();

        if let Some(column) = self.sort_by {
            filtered.sort_by(|a, b| {
                let ord = match column {
                    SortColumn::Name => a.name.cmp(&b.name),
                    SortColumn::Status => a.status.cmp(&b.status),
                    SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
                };
                match self.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let per_page = self.per_page.unwrap_or(default_per_page).max(1);
        let page = self.page.unwrap_or(1).max(1);
        let total = filtered.len();

        let start = (page - 1).saturating_mul(per_page).min(total);
        let end = start.saturating_add(per_page).min(total);
        let items = filtered[start..end].to_vec();

        FilePage {
            items,
            total,
            page,
            per_page,
        }
    }
}

/// The set of file names ticked on the delete page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<String>);

impl Selection {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn toggle(mut self, name: &str) -> Self {
        if !self.0.remove(name) {
            self.0.insert(name.to_string());
        }
        self
    }

    /// Select-all semantics of the delete page: if every listed name is
    /// already selected the whole selection is cleared, otherwise all listed
    /// names become selected.
    pub fn toggle_all<'a, I>(self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        let all_selected = names.clone().into_iter().all(|n| self.0.contains(n));
        if all_selected {
            Self::default()
        } else {
            Self(names.into_iter().map(str::to_string).collect())
        }
    }

    pub fn clear(self) -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

/// A single staged status change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusChange {
    pub id: i32,
    pub status: WorkflowStatus,
}

/// Status changes accumulated in memory before a save. Staging the same id
/// twice replaces the earlier entry; discarding clears the batch without
/// touching the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingChanges {
    changes: Vec<StatusChange>,
}

impl PendingChanges {
    pub fn stage(mut self, id: i32, status: WorkflowStatus) -> Self {
        match self.changes.iter_mut().find(|c| c.id == id) {
            Some(existing) => existing.status = status,
            None => self.changes.push(StatusChange { id, status }),
        }
        self
    }

    pub fn clear(self) -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[StatusChange] {
        &self.changes
    }

    pub fn status_for(&self, id: i32) -> Option<WorkflowStatus> {
        self.changes.iter().find(|c| c.id == id).map(|c| c.status)
    }
}
