//! Visibility rules and view builders.
//!
//! Visibility is computed per request from current membership edges, never
//! cached or materialized, so it can't drift from the membership graph.
//! Rules:
//!
//! - `admin` sees every user, team, and project.
//! - A sees user B iff A == B or they share at least one team.
//! - A team is visible to its members.
//! - A project is visible to its members and the owning team's leader.
//!
//! The view builders here are the only place store records turn into wire
//! models; derived roles are folded in at that point.

use crate::error::{Error, Result};
use crate::models::{AuditLog, Project, Role, RoleKind, Team, TeamProjectRef, User};
use crate::store::{
    AuditRecord, ProjectRecord, RoleRecord, State, TeamRecord, UserRecord, ROLE_ADMIN,
    ROLE_NORMAL_USER, ROLE_TEAM_LEADER,
};
use chrono::Utc;

pub(crate) fn is_admin(state: &State, user_id: i64) -> bool {
    state
        .users
        .get(&user_id)
        .map(|u| u.role_ids.contains(&ROLE_ADMIN))
        .unwrap_or(false)
}

/// Rejects non-admin actors with a uniform message
pub(crate) fn require_admin(state: &State, actor: i64, action: &str) -> Result<()> {
    if is_admin(state, actor) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!("only admin can {}", action)))
    }
}

pub(crate) fn require_user(state: &State, id: i64) -> Result<&UserRecord> {
    state.users.get(&id).ok_or_else(|| Error::not_found("user", id))
}

pub(crate) fn require_role(state: &State, id: i64) -> Result<&RoleRecord> {
    state.roles.get(&id).ok_or_else(|| Error::not_found("role", id))
}

pub(crate) fn require_team(state: &State, id: i64) -> Result<&TeamRecord> {
    state.teams.get(&id).ok_or_else(|| Error::not_found("team", id))
}

pub(crate) fn require_project(state: &State, id: i64) -> Result<&ProjectRecord> {
    state
        .projects
        .get(&id)
        .ok_or_else(|| Error::not_found("project", id))
}

/// True when `target` is inside `actor`'s visibility scope
pub(crate) fn user_visible(state: &State, actor: i64, target: i64) -> bool {
    if actor == target || is_admin(state, actor) {
        return true;
    }
    state
        .teams
        .values()
        .any(|t| t.member_ids.contains(&actor) && t.member_ids.contains(&target))
}

pub(crate) fn team_visible(state: &State, actor: i64, team: &TeamRecord) -> bool {
    is_admin(state, actor) || team.member_ids.contains(&actor)
}

pub(crate) fn project_visible(state: &State, actor: i64, project: &ProjectRecord) -> bool {
    if is_admin(state, actor) || project.member_ids.contains(&actor) {
        return true;
    }
    state
        .teams
        .get(&project.team_id)
        .map(|t| t.leader_id == Some(actor))
        .unwrap_or(false)
}

/// True when `actor` leads the team (admin does not count as leader)
pub(crate) fn leads_team(team: &TeamRecord, actor: i64) -> bool {
    team.leader_id == Some(actor)
}

/// Stored roles plus the derived ones, ordered by role ID
///
/// `normal user` is always present; `team leader` appears exactly while
/// the user leads at least one team. Neither is ever stored.
pub(crate) fn effective_roles(state: &State, user: &UserRecord) -> Vec<Role> {
    let mut ids = user.role_ids.clone();
    ids.insert(ROLE_NORMAL_USER);
    if state.leads_any_team(user.id) {
        ids.insert(ROLE_TEAM_LEADER);
    }
    ids.iter()
        .filter_map(|id| state.roles.get(id))
        .map(role_view)
        .collect()
}

pub(crate) fn role_view(role: &RoleRecord) -> Role {
    Role {
        id: role.id,
        name: role.name.clone(),
        kind: if role.system {
            RoleKind::System
        } else {
            RoleKind::Custom
        },
        desc: role.desc.clone(),
    }
}

pub(crate) fn user_view(state: &State, user: &UserRecord) -> User {
    User {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        nickname: user.nickname.clone(),
        logo: user.logo.clone(),
        roles: effective_roles(state, user),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub(crate) fn team_view(state: &State, team: &TeamRecord) -> Team {
    let leader = team
        .leader_id
        .and_then(|id| state.users.get(&id))
        .map(|u| user_view(state, u));

    let projects: Vec<TeamProjectRef> = state
        .projects
        .values()
        .filter(|p| p.team_id == team.id)
        .map(|p| TeamProjectRef {
            id: p.id,
            name: p.name.clone(),
        })
        .collect();

    Team {
        id: team.id,
        name: team.name.clone(),
        desc: team.desc.clone(),
        leader,
        projects: if projects.is_empty() {
            None
        } else {
            Some(projects)
        },
        created_at: team.created_at,
        updated_at: team.updated_at,
    }
}

pub(crate) fn project_view(project: &ProjectRecord) -> Project {
    Project {
        id: project.id,
        name: project.name.clone(),
        desc: project.desc.clone(),
        status: project.status,
        created_at: project.created_at,
        updated_at: project.updated_at,
    }
}

pub(crate) fn audit_view(entry: &AuditRecord) -> AuditLog {
    AuditLog {
        id: entry.id,
        content: entry.content.clone(),
        created_at: entry.created_at,
    }
}

/// Appends one audit entry; called only after an operation is accepted
pub(crate) fn record_audit(state: &mut State, content: String) {
    let id = state.alloc_audit_id();
    tracing::debug!(audit_id = id, %content, "audit");
    state.audits.push(AuditRecord {
        id,
        content,
        created_at: Utc::now(),
    });
}

/// Username of the acting user, for audit content
pub(crate) fn actor_name(state: &State, actor: i64) -> String {
    state
        .users
        .get(&actor)
        .map(|u| u.username.clone())
        .unwrap_or_else(|| format!("user {}", actor))
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil;
    use crate::models::RoleKind;

    #[tokio::test]
    async fn test_admin_sees_everyone() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let loner = testutil::member(&engine, admin, "loner").await;

        let state = engine.read().await;
        assert!(super::user_visible(&state, admin.user_id, loner.user_id));
        assert!(!super::user_visible(&state, loner.user_id, admin.user_id));
        assert!(super::user_visible(&state, loner.user_id, loner.user_id));
    }

    #[tokio::test]
    async fn test_shared_team_grants_mutual_visibility() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let a = testutil::member(&engine, admin, "vis_a").await;
        let b = testutil::member(&engine, admin, "vis_b").await;
        let c = testutil::member(&engine, admin, "vis_c").await;

        let team = engine
            .create_team(admin.user_id, "shared", None)
            .await
            .unwrap();
        engine
            .add_team_member(admin.user_id, team.id, a.user_id)
            .await
            .unwrap();
        engine
            .add_team_member(admin.user_id, team.id, b.user_id)
            .await
            .unwrap();

        let state = engine.read().await;
        assert!(super::user_visible(&state, a.user_id, b.user_id));
        assert!(super::user_visible(&state, b.user_id, a.user_id));
        assert!(!super::user_visible(&state, a.user_id, c.user_id));
    }

    #[tokio::test]
    async fn test_effective_roles_always_include_normal_user() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let user = testutil::member(&engine, admin, "roles_user").await;

        let state = engine.read().await;
        let record = state.users.get(&user.user_id).unwrap();
        let roles = super::effective_roles(&state, record);
        assert!(roles.iter().any(|r| r.name == "normal user"));
        assert!(roles.iter().all(|r| r.kind == RoleKind::System));
        assert!(!roles.iter().any(|r| r.name == "team leader"));
    }
}
