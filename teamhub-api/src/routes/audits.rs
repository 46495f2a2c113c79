/// Audit log endpoint
///
/// # Endpoints
///
/// - `GET /api/audits` - List audit entries (admin)
///
/// Supports `keyword`, the inclusive `start_at`/`end_at` window, and
/// `order_by=created_at` / `order_by=-created_at`.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ListQuery, Session},
};
use axum::{extract::State, Json};
use teamhub_core::models::{AuditLog, ListPage};

pub async fn list_audits(
    Session(actor): Session,
    State(state): State<AppState>,
    ListQuery(filter): ListQuery,
) -> ApiResult<Json<ListPage<AuditLog>>> {
    let page = state.engine.list_audits(actor.user_id, &filter).await?;
    Ok(Json(page))
}
