//! Team operations.
//!
//! Leadership is an attribute of the team, not the user: `team leader`
//! shows up in a user's roles exactly while some team points at them.
//! Removing the leader from the team (by any path) clears the pointer.

use super::visibility::{
    actor_name, is_admin, leads_team, record_audit, require_admin, require_team, require_user,
    team_view, team_visible, user_view, user_visible,
};
use super::Engine;
use crate::error::{Error, Result};
use crate::models::{ListFilter, ListPage, Team, User};
use crate::store::{State, TeamRecord};
use chrono::Utc;
use std::collections::BTreeSet;

fn can_manage_team(state: &State, actor: i64, team: &TeamRecord) -> bool {
    is_admin(state, actor) || leads_team(team, actor)
}

impl Engine {
    /// Creates a team (admin only)
    ///
    /// New teams start with no members and no leader.
    pub async fn create_team(&self, actor: i64, name: &str, desc: Option<String>) -> Result<Team> {
        let mut state = self.write().await;
        require_admin(&state, actor, "create teams")?;

        if name.is_empty() {
            return Err(Error::Invalid("team name must not be empty".to_string()));
        }

        let id = state.alloc_team_id();
        let now = Utc::now();
        state.teams.insert(
            id,
            TeamRecord {
                id,
                name: name.to_string(),
                desc,
                leader_id: None,
                member_ids: BTreeSet::new(),
                created_at: now,
                updated_at: now,
            },
        );

        let by = actor_name(&state, actor);
        record_audit(&mut state, format!("{} created team {}", by, name));

        let team = require_team(&state, id)?;
        Ok(team_view(&state, team))
    }

    /// Returns one team, subject to visibility
    pub async fn get_team(&self, actor: i64, id: i64) -> Result<Team> {
        let state = self.read().await;
        let team = require_team(&state, id)?;
        if !team_visible(&state, actor, team) {
            return Err(Error::forbidden("team is not visible to you"));
        }
        Ok(team_view(&state, team))
    }

    /// Updates a team's name and description (admin or leader)
    pub async fn update_team(
        &self,
        actor: i64,
        id: i64,
        name: Option<String>,
        desc: Option<String>,
    ) -> Result<Team> {
        let mut state = self.write().await;
        let team = require_team(&state, id)?;
        if !can_manage_team(&state, actor, team) {
            return Err(Error::forbidden("only admin or the team leader can update the team"));
        }
        if let Some(name) = &name {
            if name.is_empty() {
                return Err(Error::Invalid("team name must not be empty".to_string()));
            }
        }

        if let Some(team) = state.teams.get_mut(&id) {
            if let Some(name) = name {
                team.name = name;
            }
            if let Some(desc) = desc {
                team.desc = Some(desc);
            }
            team.updated_at = Utc::now();
        }

        let by = actor_name(&state, actor);
        let team_name = require_team(&state, id)?.name.clone();
        record_audit(&mut state, format!("{} updated team {}", by, team_name));

        let team = require_team(&state, id)?;
        Ok(team_view(&state, team))
    }

    /// Sets or clears the team leader (admin or current leader)
    ///
    /// # Errors
    ///
    /// `Invalid` when the nominee is not a member of the team.
    pub async fn set_team_leader(
        &self,
        actor: i64,
        team_id: i64,
        leader: Option<i64>,
    ) -> Result<Team> {
        let mut state = self.write().await;
        let team = require_team(&state, team_id)?;
        if !can_manage_team(&state, actor, team) {
            return Err(Error::forbidden(
                "only admin or the team leader can change the leader",
            ));
        }
        if let Some(nominee) = leader {
            require_user(&state, nominee)?;
            if !team.member_ids.contains(&nominee) {
                return Err(Error::Invalid(
                    "the leader must be a member of the team".to_string(),
                ));
            }
        }

        if let Some(team) = state.teams.get_mut(&team_id) {
            team.leader_id = leader;
            team.updated_at = Utc::now();
        }

        let by = actor_name(&state, actor);
        let team_name = require_team(&state, team_id)?.name.clone();
        let entry = match leader {
            Some(id) => format!(
                "{} made {} leader of team {}",
                by,
                actor_name(&state, id),
                team_name
            ),
            None => format!("{} cleared the leader of team {}", by, team_name),
        };
        record_audit(&mut state, entry);

        let team = require_team(&state, team_id)?;
        Ok(team_view(&state, team))
    }

    /// Deletes a team (admin or leader)
    ///
    /// Cascade: every project owned by the team is deleted along with its
    /// membership edges. Member accounts are untouched.
    pub async fn delete_team(&self, actor: i64, id: i64) -> Result<()> {
        let mut state = self.write().await;
        let team = require_team(&state, id)?;
        if !can_manage_team(&state, actor, team) {
            return Err(Error::forbidden("only admin or the team leader can delete the team"));
        }
        let name = team.name.clone();

        state.projects.retain(|_, p| p.team_id != id);
        state.teams.remove(&id);

        let by = actor_name(&state, actor);
        record_audit(&mut state, format!("{} deleted team {}", by, name));
        Ok(())
    }

    /// Adds a user to a team (admin or leader)
    ///
    /// The target must be visible to the actor. Adding an existing member
    /// is a no-op.
    pub async fn add_team_member(&self, actor: i64, team_id: i64, user_id: i64) -> Result<()> {
        let mut state = self.write().await;
        let team = require_team(&state, team_id)?;
        if !can_manage_team(&state, actor, team) {
            return Err(Error::forbidden("only admin or the team leader can add members"));
        }
        require_user(&state, user_id)?;
        if !user_visible(&state, actor, user_id) {
            return Err(Error::forbidden("user is not visible to you"));
        }

        let added = match state.teams.get_mut(&team_id) {
            Some(team) => {
                let added = team.member_ids.insert(user_id);
                if added {
                    team.updated_at = Utc::now();
                }
                added
            }
            None => return Err(Error::not_found("team", team_id)),
        };

        if added {
            let by = actor_name(&state, actor);
            let target = actor_name(&state, user_id);
            let team_name = require_team(&state, team_id)?.name.clone();
            record_audit(
                &mut state,
                format!("{} added {} to team {}", by, target, team_name),
            );
        }
        Ok(())
    }

    /// Removes a user from a team (admin, leader, or the member leaving)
    ///
    /// If the removed user was the leader, the team is left leaderless.
    /// Their edges in the team's projects are left in place.
    pub async fn remove_team_member(&self, actor: i64, team_id: i64, user_id: i64) -> Result<()> {
        let mut state = self.write().await;
        let team = require_team(&state, team_id)?;
        if !can_manage_team(&state, actor, team) && actor != user_id {
            return Err(Error::forbidden(
                "only admin, the team leader, or the member themselves can remove a member",
            ));
        }
        if !team.member_ids.contains(&user_id) {
            return Err(Error::not_found("team member", user_id));
        }

        if let Some(team) = state.teams.get_mut(&team_id) {
            team.member_ids.remove(&user_id);
            if team.leader_id == Some(user_id) {
                team.leader_id = None;
            }
            team.updated_at = Utc::now();
        }

        let by = actor_name(&state, actor);
        let target = actor_name(&state, user_id);
        let team_name = require_team(&state, team_id)?.name.clone();
        record_audit(
            &mut state,
            format!("{} removed {} from team {}", by, target, team_name),
        );
        Ok(())
    }

    /// Lists teams: all of them for admin, memberships for everyone else
    pub async fn list_teams(&self, actor: i64, filter: &ListFilter) -> Result<ListPage<Team>> {
        let state = self.read().await;
        require_user(&state, actor)?;

        let teams: Vec<Team> = state
            .teams
            .values()
            .filter(|t| team_visible(&state, actor, t))
            .filter(|t| filter.matches_name(&t.name))
            .filter(|t| filter.matches_time(t.created_at.timestamp()))
            .map(|t| team_view(&state, t))
            .collect();

        Ok(filter.paginate(teams))
    }

    /// Lists a team's members, for anyone who can see the team
    pub async fn list_team_members(
        &self,
        actor: i64,
        team_id: i64,
        filter: &ListFilter,
    ) -> Result<ListPage<User>> {
        let state = self.read().await;
        let team = require_team(&state, team_id)?;
        if !team_visible(&state, actor, team) {
            return Err(Error::forbidden("team is not visible to you"));
        }

        let members: Vec<User> = team
            .member_ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .filter(|u| filter.matches_name(&u.username))
            .map(|u| user_view(&state, u))
            .collect();

        Ok(filter.paginate(members))
    }
}
