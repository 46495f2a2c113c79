//! Session lifecycle: login, token resolution, logout, password changes.
//!
//! Sessions are bound to the credential epoch they were issued under; a
//! password change bumps the epoch and deletes every session of that user
//! in the same critical section, so the old cookie is dead before the
//! response goes out.

use super::visibility::{record_audit, user_view};
use super::{Actor, Engine};
use crate::auth::{password, token};
use crate::error::{Error, Result};
use crate::models::User;
use crate::store::SessionRecord;
use chrono::Utc;

/// Login principal: exact, case-sensitive username or email
#[derive(Debug, Clone)]
pub enum LoginPrincipal {
    Username(String),
    Email(String),
}

impl Engine {
    /// Authenticates a principal and opens a session
    ///
    /// Returns the opaque session token and the user it belongs to. A
    /// freshly created account can log in normally; the password-change
    /// gate applies to what the session may do, not to obtaining one.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for an unknown principal or a wrong password.
    pub async fn login(&self, principal: LoginPrincipal, pass: &str) -> Result<(String, User)> {
        let ttl = self.session_ttl();
        let mut state = self.write().await;

        let user = match &principal {
            LoginPrincipal::Username(username) => state.user_by_username(username),
            LoginPrincipal::Email(email) => state.user_by_email(email),
        }
        .ok_or(Error::Unauthenticated)?;

        if !password::verify_password(pass, &user.password_hash)? {
            return Err(Error::Unauthenticated);
        }

        let view = user_view(&state, user);
        let session = SessionRecord {
            user_id: user.id,
            password_epoch: user.password_epoch,
            expires_at: Utc::now() + ttl,
        };

        let tok = token::generate();
        state.sessions.insert(tok.clone(), session);
        tracing::debug!(user_id = view.id, "session opened");

        Ok((tok, view))
    }

    /// Resolves a session token to the acting identity
    ///
    /// An expired record is removed on sight, otherwise the store would
    /// accumulate one dead entry per lapsed login.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when the token is unknown, expired, issued under
    /// an older credential epoch, or its user no longer exists.
    pub async fn authenticate(&self, tok: &str) -> Result<Actor> {
        let state = self.read().await;

        let session = state.sessions.get(tok).ok_or(Error::Unauthenticated)?;
        if session.expires_at < Utc::now() {
            drop(state);
            self.write().await.sessions.remove(tok);
            return Err(Error::Unauthenticated);
        }

        let user = state
            .users
            .get(&session.user_id)
            .ok_or(Error::Unauthenticated)?;
        if user.password_epoch != session.password_epoch {
            return Err(Error::Unauthenticated);
        }

        Ok(Actor {
            user_id: user.id,
            must_change_password: user.must_change_password,
        })
    }

    /// Invalidates the calling session only
    pub async fn logout(&self, tok: &str) -> Result<()> {
        let mut state = self.write().await;
        state
            .sessions
            .remove(tok)
            .map(|_| ())
            .ok_or(Error::Unauthenticated)
    }

    /// Changes the actor's own password
    ///
    /// On success: bumps the credential epoch, clears the forced-change
    /// flag, and deletes every session of the user, including the one
    /// making this call.
    ///
    /// # Errors
    ///
    /// `Invalid` when the old password does not match.
    pub async fn change_password(&self, actor: i64, old: &str, new: &str) -> Result<()> {
        let mut state = self.write().await;

        let user = state.users.get(&actor).ok_or(Error::Unauthenticated)?;
        if !password::verify_password(old, &user.password_hash)? {
            return Err(Error::Invalid("old password is incorrect".to_string()));
        }
        if new.is_empty() {
            return Err(Error::Invalid("new password must not be empty".to_string()));
        }

        let username = user.username.clone();
        let new_hash = password::hash_password(new)?;

        if let Some(user) = state.users.get_mut(&actor) {
            user.password_hash = new_hash;
            user.password_epoch += 1;
            user.must_change_password = false;
            user.updated_at = Utc::now();
        }
        state.sessions.retain(|_, s| s.user_id != actor);

        record_audit(&mut state, format!("{} changed password", username));
        Ok(())
    }
}
