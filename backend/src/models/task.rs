use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned identifier of a task.
///
/// Only the persistence layer mints new ids; clients hand them back as
/// strings, which go through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Error)]
#[error("malformed task id: {0:?}")]
pub struct InvalidTaskId(pub String);

impl FromStr for TaskId {
    type Err = InvalidTaskId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| InvalidTaskId(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTaskRequest {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

/// A single column assignment of a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Text(String),
    Completed(bool),
}

impl UpdateTaskRequest {
    /// Changes for the fields present in the request, in column order.
    pub fn into_changes(self) -> Vec<FieldChange> {
        let mut changes = Vec::with_capacity(2);
        if let Some(text) = self.text {
            changes.push(FieldChange::Text(text));
        }
        if let Some(completed) = self.completed {
            changes.push(FieldChange::Completed(completed));
        }
        changes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
}

impl TaskStats {
    pub fn from_counts(total: i64, completed: i64) -> Self {
        Self {
            total,
            completed,
            pending: total - completed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterType {
    #[default]
    All,
    Completed,
    Pending,
}

impl FilterType {
    /// Unknown values fall back to [`FilterType::All`].
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("completed") => FilterType::Completed,
            Some("pending") => FilterType::Pending,
            _ => FilterType::All,
        }
    }

    /// Required value of the `completed` column, if any.
    pub fn completed(self) -> Option<bool> {
        match self {
            FilterType::All => None,
            FilterType::Completed => Some(true),
            FilterType::Pending => Some(false),
        }
    }
}
