/// Session endpoints
///
/// # Endpoints
///
/// - `POST /api/login` - Open a session (public)
/// - `POST /api/logout` - Close the calling session
///
/// The session token travels in an HttpOnly cookie named `session`. A
/// login body names its principal by `username` or `email`; when both are
/// present the username wins.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::session_token,
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::Deserialize;
use teamhub_core::engine::LoginPrincipal;

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username principal
    pub username: Option<String>,

    /// Email principal, used when no username is given
    pub email: Option<String>,

    /// Password
    pub password: String,
}

fn session_cookie(token: &str) -> String {
    format!("session={}; Path=/; HttpOnly", token)
}

fn expired_session_cookie() -> String {
    "session=; Path=/; HttpOnly; Max-Age=0".to_string()
}

/// Login endpoint
///
/// # Errors
///
/// - `400 Bad Request`: Neither username nor email given
/// - `401 Unauthorized`: Unknown principal or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let principal = match (req.username, req.email) {
        (Some(username), _) => LoginPrincipal::Username(username),
        (None, Some(email)) => LoginPrincipal::Email(email),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "username or email is required".to_string(),
            ))
        }
    };

    let (token, user) = state.engine.login(principal, &req.password).await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
        Json(user),
    ))
}

/// Logout endpoint
///
/// Destroys the calling session only; other sessions of the same user
/// stay alive. The cookie is expired either way.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let token = session_token(&headers)?;
    state.engine.logout(&token).await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, expired_session_cookie())]),
        Json(serde_json::json!({})),
    ))
}
