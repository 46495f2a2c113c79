//! Team model.

use crate::models::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Brief project reference embedded in team details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamProjectRef {
    pub id: i64,
    pub name: String,
}

/// A team
///
/// `leader`, when set, is always one of the team's current members; the
/// engine clears it whenever the leader leaves or is removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Unique team ID
    pub id: i64,

    /// Team name
    pub name: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Current leader, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<User>,

    /// Brief list of owned projects; omitted when the team owns none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<TeamProjectRef>>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}
