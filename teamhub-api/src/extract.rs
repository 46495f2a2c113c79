/// Request extractors: session cookie resolution and list queries
///
/// Two session extractors exist because two endpoints must stay reachable
/// while an account is still on its initial password: logging out and
/// changing the password itself. Everything else uses [`Session`], which
/// also enforces the password-change gate.

use crate::{app::AppState, error::ApiError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};
use teamhub_core::models::ListFilter;
use teamhub_core::Actor;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// A resolved session that has passed the password-change gate
pub struct Session(pub Actor);

/// A resolved session that may still be on its initial password
///
/// Only `PUT /api/me/password` and `POST /api/logout` use this.
pub struct UngatedSession(pub Actor);

/// Pulls the session token out of the request's Cookie headers
pub fn session_token(headers: &HeaderMap) -> Result<String, ApiError> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            if let Some(token) = pair.trim().strip_prefix("session=") {
                return Ok(token.to_string());
            }
        }
    }
    Err(ApiError::Unauthorized("authentication required".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for UngatedSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)?;
        let actor = state.engine.authenticate(&token).await?;
        Ok(UngatedSession(actor))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let UngatedSession(actor) = UngatedSession::from_request_parts(parts, state).await?;
        if actor.must_change_password {
            return Err(teamhub_core::Error::PasswordChangeRequired.into());
        }
        Ok(Session(actor))
    }
}

/// Common list-query parameters, collected into a [`ListFilter`]
///
/// Deserialized from raw pairs rather than a struct because `team_id` and
/// `role_name` are repeatable.
#[derive(Debug)]
pub struct ListQuery(pub ListFilter);

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse::<T>()
        .map_err(|_| ApiError::BadRequest(format!("{} must be a number", key)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ApiError> {
    value
        .parse::<bool>()
        .map_err(|_| ApiError::BadRequest(format!("{} must be true or false", key)))
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ListQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs): Query<Vec<(String, String)>> = Query::try_from_uri(&parts.uri)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let mut filter = ListFilter::default();
        for (key, value) in pairs {
            match key.as_str() {
                "order_by" => filter.order_by = Some(value),
                "page" => filter.page = Some(parse_number("page", &value)?),
                "page_size" => filter.page_size = Some(parse_number("page_size", &value)?),
                "keyword" => filter.keyword = Some(value),
                "name" => filter.name = Some(value),
                "team_id" => filter.team_ids.push(parse_number("team_id", &value)?),
                "role_name" => filter.role_names.push(value),
                "leading" => filter.leading = Some(parse_bool("leading", &value)?),
                "part_in" => filter.part_in = Some(parse_bool("part_in", &value)?),
                "start_at" => filter.start_at = Some(parse_number("start_at", &value)?),
                "end_at" => filter.end_at = Some(parse_number("end_at", &value)?),
                // Unknown parameters are ignored
                _ => {}
            }
        }

        Ok(ListQuery(filter))
    }
}
