//! Project operations.
//!
//! Every project is owned by exactly one team and dies with it. Project
//! membership is independent of team membership in one direction only:
//! adding someone to a project pulls them into the owning team, but
//! removing them from the project (or the team) never touches the other
//! edge.

use super::visibility::{
    actor_name, is_admin, leads_team, project_view, project_visible, record_audit,
    require_project, require_team, require_user, team_visible, user_view, user_visible,
};
use super::Engine;
use crate::error::{Error, Result};
use crate::models::{ListFilter, ListPage, PatchOp, Project, ProjectStatus, User};
use crate::store::{ProjectRecord, State};
use chrono::Utc;
use std::collections::BTreeSet;

fn can_manage_project(state: &State, actor: i64, project: &ProjectRecord) -> bool {
    if is_admin(state, actor) {
        return true;
    }
    state
        .teams
        .get(&project.team_id)
        .map(|t| leads_team(t, actor))
        .unwrap_or(false)
}

fn parse_status(value: &serde_json::Value) -> Result<ProjectStatus> {
    serde_json::from_value(value.clone())
        .map_err(|_| Error::Invalid(format!("{} is not a valid project status", value)))
}

impl Engine {
    /// Creates a project under a team (admin or that team's leader)
    ///
    /// New projects start in `WAIT_FOR_SCHEDULE` with no members.
    pub async fn create_project(
        &self,
        actor: i64,
        team_id: i64,
        name: &str,
        desc: Option<String>,
    ) -> Result<Project> {
        let mut state = self.write().await;
        let team = require_team(&state, team_id)?;
        if !is_admin(&state, actor) && !leads_team(team, actor) {
            return Err(Error::forbidden(
                "only admin or the team leader can create projects",
            ));
        }
        if name.is_empty() {
            return Err(Error::Invalid("project name must not be empty".to_string()));
        }

        let id = state.alloc_project_id();
        let now = Utc::now();
        state.projects.insert(
            id,
            ProjectRecord {
                id,
                team_id,
                name: name.to_string(),
                desc,
                status: ProjectStatus::WaitForSchedule,
                member_ids: BTreeSet::new(),
                created_at: now,
                updated_at: now,
            },
        );

        let by = actor_name(&state, actor);
        record_audit(&mut state, format!("{} created project {}", by, name));

        let project = require_project(&state, id)?;
        Ok(project_view(project))
    }

    /// Returns one project, subject to visibility
    pub async fn get_project(&self, actor: i64, id: i64) -> Result<Project> {
        let state = self.read().await;
        let project = require_project(&state, id)?;
        if !project_visible(&state, actor, project) {
            return Err(Error::forbidden("project is not visible to you"));
        }
        Ok(project_view(project))
    }

    /// Updates a project's name, description, or status (admin or leader)
    pub async fn update_project(
        &self,
        actor: i64,
        id: i64,
        name: Option<String>,
        desc: Option<String>,
        status: Option<ProjectStatus>,
    ) -> Result<Project> {
        let mut state = self.write().await;
        let project = require_project(&state, id)?;
        if !can_manage_project(&state, actor, project) {
            return Err(Error::forbidden(
                "only admin or the team leader can update the project",
            ));
        }
        if let Some(name) = &name {
            if name.is_empty() {
                return Err(Error::Invalid("project name must not be empty".to_string()));
            }
        }

        if let Some(project) = state.projects.get_mut(&id) {
            if let Some(name) = name {
                project.name = name;
            }
            if let Some(desc) = desc {
                project.desc = Some(desc);
            }
            if let Some(status) = status {
                project.status = status;
            }
            project.updated_at = Utc::now();
        }

        let by = actor_name(&state, actor);
        let project_name = require_project(&state, id)?.name.clone();
        record_audit(&mut state, format!("{} updated project {}", by, project_name));

        let project = require_project(&state, id)?;
        Ok(project_view(project))
    }

    /// Applies JSON-Patch style replacements to a project
    ///
    /// Accepted operations: `replace` on `/name`, `/desc`, or `/status`.
    /// The whole batch is validated before anything is applied, so a bad
    /// op leaves the project untouched.
    pub async fn patch_project(&self, actor: i64, id: i64, ops: &[PatchOp]) -> Result<Project> {
        let mut state = self.write().await;
        let project = require_project(&state, id)?;
        if !can_manage_project(&state, actor, project) {
            return Err(Error::forbidden(
                "only admin or the team leader can update the project",
            ));
        }

        enum Change {
            Name(String),
            Desc(String),
            Status(ProjectStatus),
        }

        let mut changes = Vec::with_capacity(ops.len());
        for op in ops {
            if op.op != "replace" {
                return Err(Error::Invalid(format!("unsupported patch op {}", op.op)));
            }
            let change = match op.path.as_str() {
                "/name" => match op.value.as_str() {
                    Some(name) if !name.is_empty() => Change::Name(name.to_string()),
                    _ => return Err(Error::Invalid("name must be a non-empty string".to_string())),
                },
                "/desc" => match op.value.as_str() {
                    Some(desc) => Change::Desc(desc.to_string()),
                    None => return Err(Error::Invalid("desc must be a string".to_string())),
                },
                "/status" => Change::Status(parse_status(&op.value)?),
                other => return Err(Error::Invalid(format!("unsupported patch path {}", other))),
            };
            changes.push(change);
        }

        if let Some(project) = state.projects.get_mut(&id) {
            for change in changes {
                match change {
                    Change::Name(name) => project.name = name,
                    Change::Desc(desc) => project.desc = Some(desc),
                    Change::Status(status) => project.status = status,
                }
            }
            project.updated_at = Utc::now();
        }

        let by = actor_name(&state, actor);
        let project_name = require_project(&state, id)?.name.clone();
        record_audit(&mut state, format!("{} updated project {}", by, project_name));

        let project = require_project(&state, id)?;
        Ok(project_view(project))
    }

    /// Deletes a project (admin or leader); members are untouched
    pub async fn delete_project(&self, actor: i64, id: i64) -> Result<()> {
        let mut state = self.write().await;
        let project = require_project(&state, id)?;
        if !can_manage_project(&state, actor, project) {
            return Err(Error::forbidden(
                "only admin or the team leader can delete the project",
            ));
        }
        let name = project.name.clone();

        state.projects.remove(&id);

        let by = actor_name(&state, actor);
        record_audit(&mut state, format!("{} deleted project {}", by, name));
        Ok(())
    }

    /// Adds a user to a project (admin or leader)
    ///
    /// Cascades upward: the user joins the owning team as well if they are
    /// not in it yet. Adding an existing member is a no-op.
    pub async fn add_project_member(&self, actor: i64, project_id: i64, user_id: i64) -> Result<()> {
        let mut state = self.write().await;
        let project = require_project(&state, project_id)?;
        if !can_manage_project(&state, actor, project) {
            return Err(Error::forbidden("only admin or the team leader can add members"));
        }
        require_user(&state, user_id)?;
        if !user_visible(&state, actor, user_id) {
            return Err(Error::forbidden("user is not visible to you"));
        }
        let team_id = project.team_id;

        let added = match state.projects.get_mut(&project_id) {
            Some(project) => {
                let added = project.member_ids.insert(user_id);
                if added {
                    project.updated_at = Utc::now();
                }
                added
            }
            None => return Err(Error::not_found("project", project_id)),
        };
        if let Some(team) = state.teams.get_mut(&team_id) {
            team.member_ids.insert(user_id);
        }

        if added {
            let by = actor_name(&state, actor);
            let target = actor_name(&state, user_id);
            let project_name = require_project(&state, project_id)?.name.clone();
            record_audit(
                &mut state,
                format!("{} added {} to project {}", by, target, project_name),
            );
        }
        Ok(())
    }

    /// Removes a user from a project (admin, leader, or the member leaving)
    ///
    /// Team membership is untouched.
    pub async fn remove_project_member(
        &self,
        actor: i64,
        project_id: i64,
        user_id: i64,
    ) -> Result<()> {
        let mut state = self.write().await;
        let project = require_project(&state, project_id)?;
        if !can_manage_project(&state, actor, project) && actor != user_id {
            return Err(Error::forbidden(
                "only admin, the team leader, or the member themselves can remove a member",
            ));
        }
        if !project.member_ids.contains(&user_id) {
            return Err(Error::not_found("project member", user_id));
        }

        if let Some(project) = state.projects.get_mut(&project_id) {
            project.member_ids.remove(&user_id);
            project.updated_at = Utc::now();
        }

        let by = actor_name(&state, actor);
        let target = actor_name(&state, user_id);
        let project_name = require_project(&state, project_id)?.name.clone();
        record_audit(
            &mut state,
            format!("{} removed {} from project {}", by, target, project_name),
        );
        Ok(())
    }

    /// Lists a project's members, for anyone who can see the project
    pub async fn list_project_members(
        &self,
        actor: i64,
        project_id: i64,
        filter: &ListFilter,
    ) -> Result<ListPage<User>> {
        let state = self.read().await;
        let project = require_project(&state, project_id)?;
        if !project_visible(&state, actor, project) {
            return Err(Error::forbidden("project is not visible to you"));
        }

        let members: Vec<User> = project
            .member_ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .filter(|u| filter.matches_name(&u.username))
            .map(|u| user_view(&state, u))
            .collect();

        Ok(filter.paginate(members))
    }

    /// Lists a team's projects, for anyone who can see the team
    ///
    /// `part_in` keeps only projects the actor participates in (`true`) or
    /// stays out of (`false`).
    pub async fn list_team_projects(
        &self,
        actor: i64,
        team_id: i64,
        filter: &ListFilter,
    ) -> Result<ListPage<Project>> {
        let state = self.read().await;
        let team = require_team(&state, team_id)?;
        if !team_visible(&state, actor, team) {
            return Err(Error::forbidden("team is not visible to you"));
        }

        let projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.team_id == team_id)
            .filter(|p| match filter.part_in {
                None => true,
                Some(wanted) => p.member_ids.contains(&actor) == wanted,
            })
            .filter(|p| filter.matches_name(&p.name))
            .filter(|p| filter.matches_time(p.created_at.timestamp()))
            .map(project_view)
            .collect();

        Ok(filter.paginate(projects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil;
    use serde_json::json;

    async fn team_with_leader(
        engine: &Engine,
        admin: crate::engine::Actor,
        leader: crate::engine::Actor,
    ) -> i64 {
        let team = engine
            .create_team(admin.user_id, "crew", None)
            .await
            .unwrap();
        engine
            .add_team_member(admin.user_id, team.id, leader.user_id)
            .await
            .unwrap();
        engine
            .set_team_leader(admin.user_id, team.id, Some(leader.user_id))
            .await
            .unwrap();
        team.id
    }

    #[tokio::test]
    async fn test_new_project_waits_for_schedule() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let team = engine.create_team(admin.user_id, "t", None).await.unwrap();
        let project = engine
            .create_project(admin.user_id, team.id, "fresh", None)
            .await
            .unwrap();
        assert_eq!(project.status, ProjectStatus::WaitForSchedule);
    }

    #[tokio::test]
    async fn test_only_admin_or_leader_creates_projects() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let leader = testutil::member(&engine, admin, "lead").await;
        let member = testutil::member(&engine, admin, "plain").await;
        let team_id = team_with_leader(&engine, admin, leader).await;
        engine
            .add_team_member(admin.user_id, team_id, member.user_id)
            .await
            .unwrap();

        engine
            .create_project(leader.user_id, team_id, "allowed", None)
            .await
            .unwrap();
        let err = engine
            .create_project(member.user_id, team_id, "denied", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_adding_project_member_joins_the_team() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let user = testutil::member(&engine, admin, "pulled_in").await;

        let team = engine.create_team(admin.user_id, "t", None).await.unwrap();
        let project = engine
            .create_project(admin.user_id, team.id, "magnet", None)
            .await
            .unwrap();
        engine
            .add_project_member(admin.user_id, project.id, user.user_id)
            .await
            .unwrap();

        let state = engine.read().await;
        assert!(state.teams.get(&team.id).unwrap().member_ids.contains(&user.user_id));
        assert!(state
            .projects
            .get(&project.id)
            .unwrap()
            .member_ids
            .contains(&user.user_id));
    }

    #[tokio::test]
    async fn test_leaving_project_keeps_team_membership() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let user = testutil::member(&engine, admin, "half_in").await;

        let team = engine.create_team(admin.user_id, "t", None).await.unwrap();
        let project = engine
            .create_project(admin.user_id, team.id, "p", None)
            .await
            .unwrap();
        engine
            .add_project_member(admin.user_id, project.id, user.user_id)
            .await
            .unwrap();
        engine
            .remove_project_member(user.user_id, project.id, user.user_id)
            .await
            .unwrap();

        let state = engine.read().await;
        assert!(!state
            .projects
            .get(&project.id)
            .unwrap()
            .member_ids
            .contains(&user.user_id));
        assert!(state.teams.get(&team.id).unwrap().member_ids.contains(&user.user_id));
    }

    #[tokio::test]
    async fn test_patch_replaces_status_name_and_desc() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let team = engine.create_team(admin.user_id, "t", None).await.unwrap();
        let project = engine
            .create_project(admin.user_id, team.id, "old", None)
            .await
            .unwrap();

        let ops: Vec<PatchOp> = serde_json::from_value(json!([
            {"op": "replace", "path": "/status", "value": "IN_PROGRESS"},
            {"op": "replace", "path": "/name", "value": "new"},
            {"op": "replace", "path": "/desc", "value": "moved along"}
        ]))
        .unwrap();
        let project = engine.patch_project(admin.user_id, project.id, &ops).await.unwrap();
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.name, "new");
        assert_eq!(project.desc.as_deref(), Some("moved along"));
    }

    #[tokio::test]
    async fn test_patch_rejects_bad_ops_atomically() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let team = engine.create_team(admin.user_id, "t", None).await.unwrap();
        let project = engine
            .create_project(admin.user_id, team.id, "stable", None)
            .await
            .unwrap();

        let ops: Vec<PatchOp> = serde_json::from_value(json!([
            {"op": "replace", "path": "/name", "value": "poisoned"},
            {"op": "replace", "path": "/status", "value": "NOT_A_STATUS"}
        ]))
        .unwrap();
        let err = engine
            .patch_project(admin.user_id, project.id, &ops)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));

        // First op must not have leaked through
        let project = engine.get_project(admin.user_id, project.id).await.unwrap();
        assert_eq!(project.name, "stable");

        let ops: Vec<PatchOp> = serde_json::from_value(json!([
            {"op": "remove", "path": "/name"}
        ]))
        .unwrap();
        assert!(matches!(
            engine.patch_project(admin.user_id, project.id, &ops).await,
            Err(Error::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_project_visible_to_members_and_leader_only() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let leader = testutil::member(&engine, admin, "sees_all").await;
        let member = testutil::member(&engine, admin, "sees_own").await;
        let bystander = testutil::member(&engine, admin, "sees_none").await;
        let team_id = team_with_leader(&engine, admin, leader).await;
        engine
            .add_team_member(admin.user_id, team_id, member.user_id)
            .await
            .unwrap();
        engine
            .add_team_member(admin.user_id, team_id, bystander.user_id)
            .await
            .unwrap();

        let project = engine
            .create_project(leader.user_id, team_id, "select", None)
            .await
            .unwrap();
        engine
            .add_project_member(leader.user_id, project.id, member.user_id)
            .await
            .unwrap();

        assert!(engine.get_project(leader.user_id, project.id).await.is_ok());
        assert!(engine.get_project(member.user_id, project.id).await.is_ok());
        let err = engine
            .get_project(bystander.user_id, project.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_part_in_filter() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let user = testutil::member(&engine, admin, "partial").await;

        let team = engine.create_team(admin.user_id, "t", None).await.unwrap();
        engine
            .add_team_member(admin.user_id, team.id, user.user_id)
            .await
            .unwrap();
        let joined = engine
            .create_project(admin.user_id, team.id, "joined", None)
            .await
            .unwrap();
        engine
            .create_project(admin.user_id, team.id, "skipped", None)
            .await
            .unwrap();
        engine
            .add_project_member(admin.user_id, joined.id, user.user_id)
            .await
            .unwrap();

        let filter = ListFilter {
            part_in: Some(true),
            ..Default::default()
        };
        let page = engine
            .list_team_projects(user.user_id, team.id, &filter)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].name, "joined");

        let filter = ListFilter {
            part_in: Some(false),
            ..Default::default()
        };
        let page = engine
            .list_team_projects(user.user_id, team.id, &filter)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].name, "skipped");
    }
}
