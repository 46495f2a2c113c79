//! Wire-level data structures.
//!
//! These are the shapes the HTTP layer serializes. Timestamps cross the
//! wire as unix seconds; optional fields are omitted when absent.

pub mod audit;
pub mod project;
pub mod query;
pub mod role;
pub mod team;
pub mod user;

pub use audit::AuditLog;
pub use project::{PatchOp, Project, ProjectStatus};
pub use query::{ListFilter, ListPage};
pub use role::{Role, RoleKind};
pub use team::{Team, TeamProjectRef};
pub use user::User;
