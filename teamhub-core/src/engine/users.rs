//! User account operations.

use super::visibility::{
    actor_name, effective_roles, record_audit, require_admin, require_user, user_view,
    user_visible,
};
use super::Engine;
use crate::error::{Error, Result};
use crate::models::{ListFilter, ListPage, Project, Team, User};
use crate::store::{UserRecord, ADMIN_USER_ID};
use chrono::Utc;
use std::collections::BTreeSet;

/// Self-service profile update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub logo: Option<String>,
}

impl Engine {
    /// Returns the actor's own profile
    pub async fn me(&self, actor: i64) -> Result<User> {
        let state = self.read().await;
        let user = require_user(&state, actor)?;
        Ok(user_view(&state, user))
    }

    /// Updates the actor's own profile
    ///
    /// # Errors
    ///
    /// `Conflict` when the new email is already taken by another account.
    pub async fn update_me(&self, actor: i64, update: UpdateProfile) -> Result<User> {
        let mut state = self.write().await;
        require_user(&state, actor)?;

        if let Some(email) = &update.email {
            if let Some(other) = state.user_by_email(email) {
                if other.id != actor {
                    return Err(Error::Conflict(format!("email {} is already taken", email)));
                }
            }
        }

        if let Some(user) = state.users.get_mut(&actor) {
            if let Some(email) = update.email {
                user.email = Some(email);
            }
            if let Some(nickname) = update.nickname {
                user.nickname = Some(nickname);
            }
            if let Some(logo) = update.logo {
                user.logo = Some(logo);
            }
            user.updated_at = Utc::now();
        }

        let user = require_user(&state, actor)?;
        Ok(user_view(&state, user))
    }

    /// Creates a user account (admin only)
    ///
    /// The new account starts with `must_change_password` set: it can log
    /// in, but every other operation is refused until the initial password
    /// is replaced.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admin actors, `Invalid` for an empty username or
    /// password, `Conflict` when the username is taken.
    pub async fn create_user(&self, actor: i64, username: &str, pass: &str) -> Result<User> {
        let mut state = self.write().await;
        require_admin(&state, actor, "create users")?;

        if username.is_empty() {
            return Err(Error::Invalid("username must not be empty".to_string()));
        }
        if pass.is_empty() {
            return Err(Error::Invalid("password must not be empty".to_string()));
        }
        if state.user_by_username(username).is_some() {
            return Err(Error::Conflict(format!(
                "username {} is already taken",
                username
            )));
        }

        let hash = crate::auth::password::hash_password(pass)?;
        let id = state.alloc_user_id();
        let now = Utc::now();
        state.users.insert(
            id,
            UserRecord {
                id,
                username: username.to_string(),
                email: None,
                nickname: None,
                logo: None,
                password_hash: hash,
                password_epoch: 0,
                must_change_password: true,
                role_ids: BTreeSet::new(),
                created_at: now,
                updated_at: now,
            },
        );

        let by = actor_name(&state, actor);
        record_audit(&mut state, format!("{} created user {}", by, username));

        let user = require_user(&state, id)?;
        Ok(user_view(&state, user))
    }

    /// Returns one user's profile, subject to visibility
    ///
    /// # Errors
    ///
    /// `NotFound` when no such user exists; `Forbidden` when the user
    /// exists but is outside the actor's visibility scope.
    pub async fn get_user(&self, actor: i64, id: i64) -> Result<User> {
        let state = self.read().await;
        let user = require_user(&state, id)?;
        if !user_visible(&state, actor, id) {
            return Err(Error::forbidden("user is not visible to you"));
        }
        Ok(user_view(&state, user))
    }

    /// Deletes a user account (admin only)
    ///
    /// Cascade: removes the user from every team and project, clears any
    /// leaderships they held, and destroys their sessions. Teams and
    /// projects themselves survive.
    ///
    /// # Errors
    ///
    /// `Invalid` when the target is the seeded admin account.
    pub async fn delete_user(&self, actor: i64, id: i64) -> Result<()> {
        let mut state = self.write().await;
        require_admin(&state, actor, "delete users")?;
        let user = require_user(&state, id)?;
        if id == ADMIN_USER_ID {
            return Err(Error::Invalid("the admin account cannot be deleted".to_string()));
        }
        let username = user.username.clone();

        for team in state.teams.values_mut() {
            team.member_ids.remove(&id);
            if team.leader_id == Some(id) {
                team.leader_id = None;
            }
        }
        for project in state.projects.values_mut() {
            project.member_ids.remove(&id);
        }
        state.sessions.retain(|_, s| s.user_id != id);
        state.users.remove(&id);

        let by = actor_name(&state, actor);
        record_audit(&mut state, format!("{} deleted user {}", by, username));
        Ok(())
    }

    /// Lists users inside the actor's visibility scope
    ///
    /// Supported filters: `name` (username), `keyword` (username and
    /// nickname), `team_id` (member of any), `role_name` (holds any,
    /// derived roles included), plus the creation-time window.
    pub async fn list_users(&self, actor: i64, filter: &ListFilter) -> Result<ListPage<User>> {
        let state = self.read().await;
        require_user(&state, actor)?;

        let users: Vec<User> = state
            .users
            .values()
            .filter(|u| user_visible(&state, actor, u.id))
            .filter(|u| filter.matches_name(&u.username))
            .filter(|u| {
                filter.matches_keyword(&u.username)
                    || u.nickname
                        .as_deref()
                        .map(|n| filter.matches_keyword(n))
                        .unwrap_or(false)
            })
            .filter(|u| filter.matches_time(u.created_at.timestamp()))
            .filter(|u| {
                filter.team_ids.is_empty()
                    || filter.team_ids.iter().any(|tid| {
                        state
                            .teams
                            .get(tid)
                            .map(|t| t.member_ids.contains(&u.id))
                            .unwrap_or(false)
                    })
            })
            .filter(|u| {
                filter.role_names.is_empty() || {
                    let roles = effective_roles(&state, u);
                    filter
                        .role_names
                        .iter()
                        .any(|wanted| roles.iter().any(|r| &r.name == wanted))
                }
            })
            .map(|u| user_view(&state, u))
            .collect();

        Ok(filter.paginate(users))
    }

    /// Lists the teams a user belongs to
    ///
    /// The target must be visible to the actor. The `leading` filter is
    /// evaluated against the target, not the actor.
    pub async fn list_user_teams(
        &self,
        actor: i64,
        user_id: i64,
        filter: &ListFilter,
    ) -> Result<ListPage<Team>> {
        let state = self.read().await;
        require_user(&state, user_id)?;
        if !user_visible(&state, actor, user_id) {
            return Err(Error::forbidden("user is not visible to you"));
        }

        let teams: Vec<Team> = state
            .teams
            .values()
            .filter(|t| t.member_ids.contains(&user_id))
            .filter(|t| match filter.leading {
                None => true,
                Some(wanted) => (t.leader_id == Some(user_id)) == wanted,
            })
            .filter(|t| filter.matches_name(&t.name))
            .filter(|t| filter.matches_time(t.created_at.timestamp()))
            .map(|t| super::visibility::team_view(&state, t))
            .collect();

        Ok(filter.paginate(teams))
    }

    /// Lists the projects a user participates in
    ///
    /// The target must be visible to the actor. `team_id` restricts to
    /// projects owned by any of the given teams.
    pub async fn list_user_projects(
        &self,
        actor: i64,
        user_id: i64,
        filter: &ListFilter,
    ) -> Result<ListPage<Project>> {
        let state = self.read().await;
        require_user(&state, user_id)?;
        if !user_visible(&state, actor, user_id) {
            return Err(Error::forbidden("user is not visible to you"));
        }

        let projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.member_ids.contains(&user_id))
            .filter(|p| filter.team_ids.is_empty() || filter.team_ids.contains(&p.team_id))
            .filter(|p| filter.matches_name(&p.name))
            .filter(|p| filter.matches_time(p.created_at.timestamp()))
            .map(super::visibility::project_view)
            .collect();

        Ok(filter.paginate(projects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil;

    #[tokio::test]
    async fn test_only_admin_creates_users() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let user = testutil::member(&engine, admin, "plain").await;

        let err = engine
            .create_user(user.user_id, "other", "secret123")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        engine
            .create_user(admin.user_id, "dup", "secret123")
            .await
            .unwrap();
        let err = engine
            .create_user(admin.user_id, "dup", "secret123")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        assert!(matches!(
            engine.create_user(admin.user_id, "", "secret123").await,
            Err(Error::Invalid(_))
        ));
        assert!(matches!(
            engine.create_user(admin.user_id, "nopass", "").await,
            Err(Error::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_get_user_hides_strangers() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let a = testutil::member(&engine, admin, "stranger_a").await;
        let b = testutil::member(&engine, admin, "stranger_b").await;

        let err = engine.get_user(a.user_id, b.user_id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        // Missing users stay 404, whether visible or not
        let err = engine.get_user(a.user_id, 9999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_user_cascades_edges_and_leadership() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let leader = testutil::member(&engine, admin, "doomed_leader").await;

        let team = engine
            .create_team(admin.user_id, "orphaned", None)
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
        let project = engine
            .create_project(leader.user_id, team.id, "work", None)
            .await
            .unwrap();
        engine
            .add_project_member(leader.user_id, project.id, leader.user_id)
            .await
            .unwrap();

        engine.delete_user(admin.user_id, leader.user_id).await.unwrap();

        let state = engine.read().await;
        let team = state.teams.get(&team.id).unwrap();
        assert_eq!(team.leader_id, None);
        assert!(!team.member_ids.contains(&leader.user_id));
        let project = state.projects.get(&project.id).unwrap();
        assert!(!project.member_ids.contains(&leader.user_id));
        assert!(state.users.get(&leader.user_id).is_none());
    }

    #[tokio::test]
    async fn test_admin_account_cannot_be_deleted() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let err = engine
            .delete_user(admin.user_id, admin.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[tokio::test]
    async fn test_list_users_is_visibility_scoped() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let a = testutil::member(&engine, admin, "list_a").await;
        let b = testutil::member(&engine, admin, "list_b").await;
        testutil::member(&engine, admin, "list_c").await;

        let team = engine.create_team(admin.user_id, "pair", None).await.unwrap();
        engine
            .add_team_member(admin.user_id, team.id, a.user_id)
            .await
            .unwrap();
        engine
            .add_team_member(admin.user_id, team.id, b.user_id)
            .await
            .unwrap();

        let page = engine
            .list_users(a.user_id, &ListFilter::default())
            .await
            .unwrap();
        let names: Vec<&str> = page.list.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["list_a", "list_b"]);

        // Admin sees every account
        let page = engine
            .list_users(admin.user_id, &ListFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn test_list_users_role_name_filter_sees_derived_roles() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let leader = testutil::member(&engine, admin, "filter_leader").await;
        testutil::member(&engine, admin, "filter_plain").await;

        let team = engine.create_team(admin.user_id, "led", None).await.unwrap();
        engine
            .add_team_member(admin.user_id, team.id, leader.user_id)
            .await
            .unwrap();
        engine
            .set_team_leader(admin.user_id, team.id, Some(leader.user_id))
            .await
            .unwrap();

        let filter = ListFilter {
            role_names: vec!["team leader".to_string()],
            ..Default::default()
        };
        let page = engine.list_users(admin.user_id, &filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].username, "filter_leader");
    }

    #[tokio::test]
    async fn test_update_me_rejects_taken_email() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let a = testutil::member(&engine, admin, "mail_a").await;
        let b = testutil::member(&engine, admin, "mail_b").await;

        engine
            .update_me(
                a.user_id,
                UpdateProfile {
                    email: Some("shared@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = engine
            .update_me(
                b.user_id,
                UpdateProfile {
                    email: Some("shared@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // Re-submitting your own email is fine
        engine
            .update_me(
                a.user_id,
                UpdateProfile {
                    email: Some("shared@example.com".to_string()),
                    nickname: Some("al".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_user_teams_leading_filter() {
        let engine = testutil::engine().await;
        let admin = testutil::admin(&engine).await;
        let user = testutil::member(&engine, admin, "two_hats").await;

        let led = engine.create_team(admin.user_id, "led", None).await.unwrap();
        let plain = engine
            .create_team(admin.user_id, "plain", None)
            .await
            .unwrap();
        engine
            .add_team_member(admin.user_id, led.id, user.user_id)
            .await
            .unwrap();
        engine
            .add_team_member(admin.user_id, plain.id, user.user_id)
            .await
            .unwrap();
        engine
            .set_team_leader(admin.user_id, led.id, Some(user.user_id))
            .await
            .unwrap();

        let filter = ListFilter {
            leading: Some(true),
            ..Default::default()
        };
        let page = engine.list_user_teams(user.user_id, user.user_id, &filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].name, "led");

        let filter = ListFilter {
            leading: Some(false),
            ..Default::default()
        };
        let page = engine.list_user_teams(user.user_id, user.user_id, &filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].name, "plain");
    }
}
