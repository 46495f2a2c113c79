//! # TeamHub Core
//!
//! Domain engine for the TeamHub collaboration backend: users, roles,
//! teams, projects, the membership graph between them, and the rules that
//! decide what each authenticated actor may see and do.
//!
//! ## Module Organization
//!
//! - `models`: wire-level data structures (users, roles, teams, projects, audit entries)
//! - `auth`: password hashing and session token generation
//! - `store`: the in-memory transactional state behind a single `RwLock`
//! - `engine`: the operations layer (sessions, visibility, cascades, audit)
//! - `error`: the error taxonomy shared by every operation

pub mod auth;
pub mod engine;
pub mod error;
pub mod models;
pub mod store;

pub use engine::{Actor, Engine, EngineConfig};
pub use error::Error;

/// Current version of the TeamHub core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
