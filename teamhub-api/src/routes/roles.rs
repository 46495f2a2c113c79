/// Role catalogue endpoints
///
/// # Endpoints
///
/// - `GET    /api/roles` - List roles (public, used by login screens)
/// - `POST   /api/roles` - Create a Custom role (admin)
/// - `DELETE /api/roles/{id}` - Delete a Custom role (admin)

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
use teamhub_core::models::{ListPage, Role};
use validator::Validate;

/// Role creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64, message = "role name must be 1-64 characters"))]
    pub name: String,

    pub desc: Option<String>,
}

/// Lists the role catalogue; the only listing with no session
pub async fn list_roles(
    State(state): State<AppState>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<Role>>> {
    let page = state.engine.list_roles(&filter).await?;
    Ok(Json(page))
}

pub async fn create_role(
    Session(actor): Session,
    State(state): State<AppState>,
    Json(req): Json<CreateRoleRequest>,
) -> ApiResult<Json<Role>> {
    req.validate()?;
    let role = state
        .engine
        .create_role(actor.user_id, &req.name, req.desc)
        .await?;
    Ok(Json(role))
}

pub async fn delete_role(
    Session(actor): Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.engine.delete_role(actor.user_id, id).await?;
    Ok(Json(json!({})))
}
