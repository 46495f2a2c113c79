//! Project model and the JSON-patch-style operation applied to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project lifecycle status
///
/// New projects always start in `WaitForSchedule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    WaitForSchedule,
    InProgress,
    Finished,
}

/// A project, owned by exactly one team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID
    pub id: i64,

    /// Project name
    pub name: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Lifecycle status
    pub status: ProjectStatus,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

/// One JSON-patch-style operation
///
/// Projects accept `replace` on `/status`, `/name`, and `/desc`; teams
/// accept `replace` on `/leader`. Anything else is rejected as invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: serde_json::Value,
}
