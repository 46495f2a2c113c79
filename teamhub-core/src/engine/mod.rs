//! The operations layer.
//!
//! [`Engine`] is the single entry point for every operation the HTTP
//! surface exposes. It owns the shared [`State`](crate::store::State)
//! behind one `RwLock`; each mutating operation takes the write lock once
//! and runs its checks and cascade inside that critical section. Checks
//! always run in the same order (visibility, permission, invariant) and
//! short-circuit, so a failed operation never mutates anything.
//!
//! The engine is deliberately free of global state: construct one, clone
//! it (cheap, it is an `Arc` inside), hand it to the router and to tests.

use crate::auth::password;
use crate::error::Result;
use crate::store::State;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::RwLock;

mod audits;
mod projects;
mod roles;
mod sessions;
mod teams;
mod users;
mod visibility;

pub use sessions::LoginPrincipal;
pub use users::UpdateProfile;

/// Engine construction parameters
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial password for the seeded admin account
    pub admin_password: String,

    /// How long an issued session stays valid
    pub session_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            admin_password: "admin".to_string(),
            session_ttl: Duration::hours(24),
        }
    }
}

/// The authenticated identity attached to a request
///
/// Produced by [`Engine::authenticate`]; carries just enough for the HTTP
/// layer to enforce the password-change gate. All authorization decisions
/// happen inside the engine against current state.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: i64,
    pub must_change_password: bool,
}

/// The TeamHub domain engine
#[derive(Clone)]
pub struct Engine {
    state: Arc<RwLock<State>>,
    session_ttl: Duration,
}

impl Engine {
    /// Creates an engine with freshly seeded state
    ///
    /// Seeds the three System roles and the `admin` account, which must
    /// change the configured initial password before doing anything else.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing the initial admin password fails.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let admin_hash = password::hash_password(&config.admin_password)?;
        Ok(Engine {
            state: Arc::new(RwLock::new(State::seeded(admin_hash))),
            session_ttl: config.session_ttl,
        })
    }

    pub(crate) fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub(crate) async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, State> {
        self.state.read().await
    }

    pub(crate) async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, State> {
        self.state.write().await
    }
}
