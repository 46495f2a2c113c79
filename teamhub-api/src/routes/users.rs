/// User management endpoints
///
/// # Endpoints
///
/// - `POST   /api/users` - Create an account (admin)
/// - `GET    /api/users` - List visible accounts
/// - `GET    /api/users/{id}` - One account, subject to visibility
/// - `DELETE /api/users/{id}` - Delete an account (admin)
/// - `GET    /api/users/{id}/teams` - Teams of a visible user
/// - `GET    /api/users/{id}/projects` - Projects of a visible user
/// - `POST   /api/users/{id}/roles` - Assign a Custom role (admin)
/// - `DELETE /api/users/{id}/roles/{roleId}` - Revoke a Custom role (admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ListQuery, Session},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use teamhub_core::models::{ListPage, Project, Team, User};
use validator::Validate;

/// Account creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Login name, unique across accounts
    #[validate(length(min = 1, max = 64, message = "username must be 1-64 characters"))]
    pub username: String,

    /// Initial password; the account must replace it before doing anything
    pub password: String,
}

/// Role assignment request
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    /// Role ID to assign
    pub id: i64,
}

pub async fn create_user(
    Session(actor): Session,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    let user = state
        .engine
        .create_user(actor.user_id, &req.username, &req.password)
        .await?;
    Ok(Json(user))
}

pub async fn list_users(
    Session(actor): Session,
    State(state): State<AppState>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<User>>> {
    let page = state.engine.list_users(actor.user_id, &filter).await?;
    Ok(Json(page))
}

pub async fn get_user(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    let user = state.engine.get_user(actor.user_id, id).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.engine.delete_user(actor.user_id, id).await?;
    Ok(Json(json!({})))
}

pub async fn list_user_teams(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<Team>>> {
    let page = state
        .engine
        .list_user_teams(actor.user_id, id, &filter)
        .await?;
    Ok(Json(page))
}

pub async fn list_user_projects(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<Project>>> {
    let page = state
        .engine
        .list_user_projects(actor.user_id, id, &filter)
        .await?;
    Ok(Json(page))
}

pub async fn assign_role(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<Value>> {
    state.engine.assign_role(actor.user_id, id, req.id).await?;
    Ok(Json(json!({})))
}

pub async fn revoke_role(
    Session(actor): Session,
    State(state): State<AppState>,
    Path((id, role_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Value>> {
    state.engine.revoke_role(actor.user_id, id, role_id).await?;
    Ok(Json(json!({})))
}
