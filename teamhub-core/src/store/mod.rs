//! In-memory transactional store.
//!
//! All shared state lives in one [`State`] value behind a single
//! `tokio::sync::RwLock` owned by the engine. Every mutating operation
//! takes the write lock once and applies its whole cascade inside that
//! critical section, so no reader ever observes a half-applied change:
//! transaction boundaries, not per-entity locks. The store is plain data;
//! the rules live in [`crate::engine`].

use crate::models::ProjectStatus;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fixed ID of the seeded System `admin` role
pub const ROLE_ADMIN: i64 = 1;
/// Fixed ID of the derived System `team leader` role
pub const ROLE_TEAM_LEADER: i64 = 2;
/// Fixed ID of the derived System `normal user` role
pub const ROLE_NORMAL_USER: i64 = 3;

/// Fixed ID of the seeded admin account
pub const ADMIN_USER_ID: i64 = 1;

/// Stored user account
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub logo: Option<String>,
    /// Argon2id PHC hash
    pub password_hash: String,
    /// Bumped on every password change; sessions carry the epoch they were
    /// issued under and die when it moves
    pub password_epoch: u64,
    /// Set at creation, cleared by the first successful password change
    pub must_change_password: bool,
    /// Directly assigned role IDs (Custom roles, plus `admin` for the seed
    /// account). Derived roles are never stored here.
    pub role_ids: BTreeSet<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored role
#[derive(Debug, Clone)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
    pub system: bool,
    pub desc: Option<String>,
}

/// Stored team with its membership edge set
#[derive(Debug, Clone)]
pub struct TeamRecord {
    pub id: i64,
    pub name: String,
    pub desc: Option<String>,
    /// Invariant: when set, always a member of `member_ids`
    pub leader_id: Option<i64>,
    pub member_ids: BTreeSet<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored project with its membership edge set
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: i64,
    /// Owning team; projects die with their team
    pub team_id: i64,
    pub name: String,
    pub desc: Option<String>,
    pub status: ProjectStatus,
    pub member_ids: BTreeSet<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Live session bound to a credential epoch
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: i64,
    /// Epoch of the credential this session was issued under
    pub password_epoch: u64,
    pub expires_at: DateTime<Utc>,
}

/// Append-only audit record
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The whole engine state
///
/// BTreeMaps keep listings in stable ID order without extra sorting.
#[derive(Debug)]
pub struct State {
    pub users: BTreeMap<i64, UserRecord>,
    pub roles: BTreeMap<i64, RoleRecord>,
    pub teams: BTreeMap<i64, TeamRecord>,
    pub projects: BTreeMap<i64, ProjectRecord>,
    pub sessions: HashMap<String, SessionRecord>,
    pub audits: Vec<AuditRecord>,

    next_user_id: i64,
    next_role_id: i64,
    next_team_id: i64,
    next_project_id: i64,
    next_audit_id: i64,
}

impl State {
    /// Creates the seeded state: three System roles and the admin account
    ///
    /// The admin account holds the `admin` role directly and must change
    /// the initial password before doing anything else.
    pub fn seeded(admin_password_hash: String) -> Self {
        let now = Utc::now();

        let mut roles = BTreeMap::new();
        for (id, name) in [
            (ROLE_ADMIN, "admin"),
            (ROLE_TEAM_LEADER, "team leader"),
            (ROLE_NORMAL_USER, "normal user"),
        ] {
            roles.insert(
                id,
                RoleRecord {
                    id,
                    name: name.to_string(),
                    system: true,
                    desc: None,
                },
            );
        }

        let mut users = BTreeMap::new();
        users.insert(
            ADMIN_USER_ID,
            UserRecord {
                id: ADMIN_USER_ID,
                username: "admin".to_string(),
                email: None,
                nickname: None,
                logo: None,
                password_hash: admin_password_hash,
                password_epoch: 0,
                must_change_password: true,
                role_ids: BTreeSet::from([ROLE_ADMIN]),
                created_at: now,
                updated_at: now,
            },
        );

        State {
            users,
            roles,
            teams: BTreeMap::new(),
            projects: BTreeMap::new(),
            sessions: HashMap::new(),
            audits: Vec::new(),
            next_user_id: ADMIN_USER_ID + 1,
            next_role_id: ROLE_NORMAL_USER + 1,
            next_team_id: 1,
            next_project_id: 1,
            next_audit_id: 1,
        }
    }

    pub fn alloc_user_id(&mut self) -> i64 {
        let id = self.next_user_id;
        self.next_user_id += 1;
        id
    }

    pub fn alloc_role_id(&mut self) -> i64 {
        let id = self.next_role_id;
        self.next_role_id += 1;
        id
    }

    pub fn alloc_team_id(&mut self) -> i64 {
        let id = self.next_team_id;
        self.next_team_id += 1;
        id
    }

    pub fn alloc_project_id(&mut self) -> i64 {
        let id = self.next_project_id;
        self.next_project_id += 1;
        id
    }

    pub fn alloc_audit_id(&mut self) -> i64 {
        let id = self.next_audit_id;
        self.next_audit_id += 1;
        id
    }

    /// Looks a user up by login principal (exact, case-sensitive)
    pub fn user_by_username(&self, username: &str) -> Option<&UserRecord> {
        self.users.values().find(|u| u.username == username)
    }

    /// Looks a user up by email (exact match)
    pub fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
    }

    /// True when the user currently leads at least one team
    pub fn leads_any_team(&self, user_id: i64) -> bool {
        self.teams.values().any(|t| t.leader_id == Some(user_id))
    }
}
