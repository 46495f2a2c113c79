//! User model as exposed to clients.

use crate::models::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account
///
/// The `roles` list always includes the derived roles (`normal user` for
/// everyone, `team leader` while the user leads at least one team) on top
/// of the stored assignments. Credentials never leave the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Login name, unique and case-sensitive
    pub username: String,

    /// Optional email address; usable as a login principal once set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Optional display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    /// Optional avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Effective roles (stored plus derived), ordered by role ID
    pub roles: Vec<Role>,

    /// When the account was created (unix seconds on the wire)
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}
