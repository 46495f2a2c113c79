//! Audit log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable record of an accepted mutating operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique entry ID, monotonically increasing
    pub id: i64,

    /// Human-readable description: actor, action, subject
    pub content: String,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}
