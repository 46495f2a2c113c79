/// Team endpoints
///
/// # Endpoints
///
/// - `GET    /api/teams` - List visible teams
/// - `POST   /api/teams` - Create a team (admin)
/// - `GET    /api/teams/{id}` - One team
/// - `PUT    /api/teams/{id}` - Update name/description (admin or leader)
/// - `PATCH  /api/teams/{id}` - Replace the leader (admin or leader)
/// - `DELETE /api/teams/{id}` - Delete, cascading into projects
/// - `GET    /api/teams/{id}/users` - Members
/// - `POST   /api/teams/{id}/users` - Add a member (admin or leader)
/// - `DELETE /api/teams/{id}/users/{userId}` - Remove a member
///
/// The PATCH body is a JSON-Patch style list; the only supported op is
/// `replace` on `/leader`, whose value is `{"id": N}` or `null`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ListQuery, Session},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use teamhub_core::models::{ListPage, PatchOp, Team, User};
use validator::Validate;

/// Team creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100, message = "team name must be 1-100 characters"))]
    pub name: String,

    pub desc: Option<String>,
}

/// Team update request; absent fields stay as they are
#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub desc: Option<String>,
}

pub async fn list_teams(
    Session(actor): Session,
    State(state): State<AppState>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<Team>>> {
    let page = state.engine.list_teams(actor.user_id, &filter).await?;
    Ok(Json(page))
}

pub async fn create_team(
    Session(actor): Session,
    State(state): State<AppState>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<Json<Team>> {
    req.validate()?;
    let team = state
        .engine
        .create_team(actor.user_id, &req.name, req.desc)
        .await?;
    Ok(Json(team))
}

pub async fn get_team(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Team>> {
    let team = state.engine.get_team(actor.user_id, id).await?;
    Ok(Json(team))
}

pub async fn update_team(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTeamRequest>,
) -> ApiResult<Json<Team>> {
    let team = state
        .engine
        .update_team(actor.user_id, id, req.name, req.desc)
        .await?;
    Ok(Json(team))
}

/// Replaces the team leader through a patch document
pub async fn patch_team(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(ops): Json<Vec<PatchOp>>,
) -> ApiResult<Json<Team>> {
    if ops.is_empty() {
        return Err(ApiError::BadRequest("empty patch document".to_string()));
    }

    let mut team = None;
    for op in ops {
        if op.op != "replace" || op.path != "/leader" {
            return Err(ApiError::BadRequest(format!(
                "unsupported patch op {} on {}",
                op.op, op.path
            )));
        }
        let leader = if op.value.is_null() {
            None
        } else {
            match op.value.get("id").and_then(|v| v.as_i64()) {
                Some(id) => Some(id),
                None => {
                    return Err(ApiError::BadRequest(
                        "leader value must be {\"id\": N} or null".to_string(),
                    ))
                }
            }
        };
        team = Some(state.engine.set_team_leader(actor.user_id, id, leader).await?);
    }

    // Unreachable when ops is non-empty, but the compiler can't see that
    match team {
        Some(team) => Ok(Json(team)),
        None => Err(ApiError::BadRequest("empty patch document".to_string())),
    }
}

pub async fn delete_team(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.engine.delete_team(actor.user_id, id).await?;
    Ok(Json(json!({})))
}

pub async fn list_team_members(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<User>>> {
    let page = state
        .engine
        .list_team_members(actor.user_id, id, &filter)
        .await?;
    Ok(Json(page))
}

/// Membership request: the user to add
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub id: i64,
}

pub async fn add_team_member(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<Value>> {
    state
        .engine
        .add_team_member(actor.user_id, id, req.id)
        .await?;
    Ok(Json(json!({})))
}

pub async fn remove_team_member(
    Session(actor): Session,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Value>> {
    state
        .engine
        .remove_team_member(actor.user_id, id, user_id)
        .await?;
    Ok(Json(json!({})))
}
