/// Self-service endpoints
///
/// # Endpoints
///
/// - `GET    /api/me` - Own profile
/// - `PUT    /api/me` - Update own profile
/// - `PUT    /api/me/password` - Change own password (reachable while gated)
/// - `GET    /api/me/teams` - Own teams, with `leading` filter
/// - `DELETE /api/me/teams/{id}` - Leave a team
/// - `GET    /api/me/projects` - Own projects, with `team_id` filter
/// - `DELETE /api/me/projects/{id}` - Leave a project

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ListQuery, Session, UngatedSession},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use teamhub_core::engine::UpdateProfile;
use teamhub_core::models::{ListPage, Project, Team, User};
use validator::Validate;

/// Profile update request; absent fields stay as they are
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    /// New email address, must be unique across accounts
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,

    /// Display name
    #[validate(length(max = 100, message = "nickname must be at most 100 characters"))]
    pub nickname: Option<String>,

    /// Avatar URL
    pub logo: Option<String>,
}

/// Password change request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password
    pub old_password: String,

    /// Replacement password
    pub new_password: String,
}

pub async fn get_me(Session(actor): Session, State(state): State<AppState>) -> ApiResult<Json<User>> {
    let user = state.engine.me(actor.user_id).await?;
    Ok(Json(user))
}

pub async fn update_me(
    Session(actor): Session,
    State(state): State<AppState>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    let user = state
        .engine
        .update_me(
            actor.user_id,
            UpdateProfile {
                email: req.email,
                nickname: req.nickname,
                logo: req.logo,
            },
        )
        .await?;
    Ok(Json(user))
}

/// Changes the caller's password
///
/// Uses the ungated session so an account still on its initial password
/// can get here. On success every session of the account is destroyed,
/// the one used for this request included.
pub async fn change_password(
    UngatedSession(actor): UngatedSession,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    state
        .engine
        .change_password(actor.user_id, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(json!({})))
}

pub async fn list_my_teams(
    Session(actor): Session,
    State(state): State<AppState>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<Team>>> {
    let page = state
        .engine
        .list_user_teams(actor.user_id, actor.user_id, &filter)
        .await?;
    Ok(Json(page))
}

pub async fn exit_team(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state
        .engine
        .remove_team_member(actor.user_id, id, actor.user_id)
        .await?;
    Ok(Json(json!({})))
}

pub async fn list_my_projects(
    Session(actor): Session,
    State(state): State<AppState>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<Project>>> {
    let page = state
        .engine
        .list_user_projects(actor.user_id, actor.user_id, &filter)
        .await?;
    Ok(Json(page))
}

pub async fn exit_project(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state
        .engine
        .remove_project_member(actor.user_id, id, actor.user_id)
        .await?;
    Ok(Json(json!({})))
}
