/// Project endpoints
///
/// # Endpoints
///
/// - `GET    /api/teams/{id}/projects` - Projects of a team, `part_in` filter
/// - `POST   /api/teams/{id}/projects` - Create a project (admin or leader)
/// - `GET    /api/projects/{id}` - One project, subject to visibility
/// - `PUT    /api/projects/{id}` - Update name/desc/status
/// - `PATCH  /api/projects/{id}` - JSON-Patch replace on /name, /desc, /status
/// - `DELETE /api/projects/{id}` - Delete the project
/// - `GET    /api/projects/{id}/users` - Members
/// - `POST   /api/projects/{id}/users` - Add a member, joins the team too
/// - `DELETE /api/projects/{id}/users/{userId}` - Remove a member

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
use teamhub_core::models::{ListPage, PatchOp, Project, ProjectStatus, User};
use validator::Validate;

/// Project creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "project name must be 1-100 characters"))]
    pub name: String,

    pub desc: Option<String>,
}

/// Project update request; absent fields stay as they are
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub status: Option<ProjectStatus>,
}

/// Membership request: the user to add
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub id: i64,
}

pub async fn list_team_projects(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<Project>>> {
    let page = state
        .engine
        .list_team_projects(actor.user_id, id, &filter)
        .await?;
    Ok(Json(page))
}

pub async fn create_project(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;
    let project = state
        .engine
        .create_project(actor.user_id, id, &req.name, req.desc)
        .await?;
    Ok(Json(project))
}

pub async fn get_project(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Project>> {
    let project = state.engine.get_project(actor.user_id, id).await?;
    Ok(Json(project))
}

pub async fn update_project(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project = state
        .engine
        .update_project(actor.user_id, id, req.name, req.desc, req.status)
        .await?;
    Ok(Json(project))
}

pub async fn patch_project(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(ops): Json<Vec<PatchOp>>,
) -> ApiResult<Json<Project>> {
    let project = state.engine.patch_project(actor.user_id, id, &ops).await?;
    Ok(Json(project))
}

pub async fn delete_project(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.engine.delete_project(actor.user_id, id).await?;
    Ok(Json(json!({})))
}

pub async fn list_project_members(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<User>>> {
    let page = state
        .engine
        .list_project_members(actor.user_id, id, &filter)
        .await?;
    Ok(Json(page))
}

pub async fn add_project_member(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<Value>> {
    state
        .engine
        .add_project_member(actor.user_id, id, req.id)
        .await?;
    Ok(Json(json!({})))
}

pub async fn remove_project_member(
    Session(actor): Session,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Value>> {
    state
        .engine
        .remove_project_member(actor.user_id, id, user_id)
        .await?;
    Ok(Json(json!({})))
}
