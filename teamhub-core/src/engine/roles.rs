//! Role catalogue and assignment.
//!
//! The three System roles are fixed: `admin` is held directly by the seed
//! account, `team leader` and `normal user` are derived at view time and
//! can never be assigned, revoked, or deleted. Custom roles are plain
//! labels with no effect on authorization.

use super::visibility::{actor_name, record_audit, require_admin, require_role, require_user, role_view};
use super::Engine;
use crate::error::{Error, Result};
use crate::models::{ListFilter, ListPage, Role};
use crate::store::RoleRecord;

impl Engine {
    /// Lists the role catalogue
    ///
    /// This is the one listing that needs no session at all.
    pub async fn list_roles(&self, filter: &ListFilter) -> Result<ListPage<Role>> {
        let state = self.read().await;
        let roles: Vec<Role> = state
            .roles
            .values()
            .filter(|r| filter.matches_name(&r.name))
            .map(role_view)
            .collect();
        Ok(filter.paginate(roles))
    }

    /// Creates a Custom role (admin only)
    ///
    /// # Errors
    ///
    /// `Invalid` for an empty name, `Conflict` when the name is taken.
    pub async fn create_role(&self, actor: i64, name: &str, desc: Option<String>) -> Result<Role> {
        let mut state = self.write().await;
        require_admin(&state, actor, "create roles")?;

        if name.is_empty() {
            return Err(Error::Invalid("role name must not be empty".to_string()));
        }
        if state.roles.values().any(|r| r.name == name) {
            return Err(Error::Conflict(format!("role {} already exists", name)));
        }

        let id = state.alloc_role_id();
        state.roles.insert(
            id,
            RoleRecord {
                id,
                name: name.to_string(),
                system: false,
                desc,
            },
        );

        let by = actor_name(&state, actor);
        record_audit(&mut state, format!("{} created role {}", by, name));

        let role = require_role(&state, id)?;
        Ok(role_view(role))
    }

    /// Deletes a Custom role (admin only), unassigning it from every holder
    ///
    /// # Errors
    ///
    /// `Invalid` when the target is a System role.
    pub async fn delete_role(&self, actor: i64, id: i64) -> Result<()> {
        let mut state = self.write().await;
        require_admin(&state, actor, "delete roles")?;
        let role = require_role(&state, id)?;
        if role.system {
            return Err(Error::Invalid("System roles cannot be deleted".to_string()));
        }
        let name = role.name.clone();

        for user in state.users.values_mut() {
            user.role_ids.remove(&id);
        }
        state.roles.remove(&id);

        let by = actor_name(&state, actor);
        record_audit(&mut state, format!("{} deleted role {}", by, name));
        Ok(())
    }

    /// Assigns a Custom role to a user (admin only)
    ///
    /// Idempotent when the user already holds the role.
    pub async fn assign_role(&self, actor: i64, user_id: i64, role_id: i64) -> Result<()> {
        let mut state = self.write().await;
        require_admin(&state, actor, "assign roles")?;
        require_user(&state, user_id)?;
        let role = require_role(&state, role_id)?;
        if role.system {
            return Err(Error::Invalid("System roles cannot be assigned".to_string()));
        }
        let role_name = role.name.clone();

        let username = match state.users.get_mut(&user_id) {
            Some(user) => {
                user.role_ids.insert(role_id);
                user.username.clone()
            }
            None => return Err(Error::not_found("user", user_id)),
        };

        let by = actor_name(&state, actor);
        record_audit(
            &mut state,
            format!("{} assigned role {} to {}", by, role_name, username),
        );
        Ok(())
    }

    /// Revokes a Custom role from a user (admin only)
    pub async fn revoke_role(&self, actor: i64, user_id: i64, role_id: i64) -> Result<()> {
        let mut state = self.write().await;
        require_admin(&state, actor, "revoke roles")?;
        require_user(&state, user_id)?;
        let role = require_role(&state, role_id)?;
        if role.system {
            return Err(Error::Invalid("System roles cannot be revoked".to_string()));
        }
        let role_name = role.name.clone();

        let username = match state.users.get_mut(&user_id) {
            Some(user) => {
                user.role_ids.remove(&role_id);
                user.username.clone()
            }
            None => return Err(Error::not_found("user", user_id)),
        };

        let by = actor_name(&state, actor);
        record_audit(
            &mut state,
            format!("{} revoked role {} from {}", by, role_name, username),
        );
        Ok(())
    }
}
