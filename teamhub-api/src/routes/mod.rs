/// API route handlers
///
/// Handlers are grouped by URL prefix. Authentication is declared through
/// the extractor each handler takes, not through middleware, so a glance
/// at a handler's signature tells you whether it is public, ungated, or
/// fully gated.

pub mod audits;
pub mod auth;
pub mod health;
pub mod me;
pub mod projects;
pub mod roles;
pub mod teams;
pub mod users;
