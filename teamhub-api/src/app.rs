/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use teamhub_core::{Engine, EngineConfig};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Cloning is cheap; the engine is an `Arc` inside.
#[derive(Clone)]
pub struct AppState {
    /// Domain engine holding all live state
    pub engine: Engine,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state with a freshly seeded engine
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let engine = Engine::new(EngineConfig {
            admin_password: config.auth.admin_password.clone(),
            session_ttl: chrono::Duration::hours(config.auth.session_ttl_hours),
        })?;
        Ok(Self {
            engine,
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /healthz                       # Health check (public)
/// └── /api/
///     ├── POST /login                # Open a session (public)
///     ├── POST /logout               # Close the calling session
///     ├── /me                        # Own profile, teams, projects
///     ├── /users                     # Accounts and role assignment
///     ├── /teams                     # Teams, members, projects
///     ├── /projects                  # Projects and members
///     ├── /roles                     # Role catalogue (GET is public)
///     └── /audits                    # Audit log (admin only)
/// ```
///
/// Authentication is handled by the extractors in [`crate::extract`], so
/// public routes are simply the ones whose handlers take no session.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let api_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/me", get(routes::me::get_me).put(routes::me::update_me))
        .route("/me/password", put(routes::me::change_password))
        .route("/me/teams", get(routes::me::list_my_teams))
        .route("/me/teams/:id", delete(routes::me::exit_team))
        .route("/me/projects", get(routes::me::list_my_projects))
        .route("/me/projects/:id", delete(routes::me::exit_project))
        .route(
            "/users",
            post(routes::users::create_user).get(routes::users::list_users),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user).delete(routes::users::delete_user),
        )
        .route("/users/:id/teams", get(routes::users::list_user_teams))
        .route("/users/:id/projects", get(routes::users::list_user_projects))
        .route("/users/:id/roles", post(routes::users::assign_role))
        .route(
            "/users/:id/roles/:role_id",
            delete(routes::users::revoke_role),
        )
        .route(
            "/teams",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route(
            "/teams/:id",
            get(routes::teams::get_team)
                .put(routes::teams::update_team)
                .patch(routes::teams::patch_team)
                .delete(routes::teams::delete_team),
        )
        .route(
            "/teams/:id/users",
            get(routes::teams::list_team_members).post(routes::teams::add_team_member),
        )
        .route(
            "/teams/:id/users/:user_id",
            delete(routes::teams::remove_team_member),
        )
        .route(
            "/teams/:id/projects",
            get(routes::projects::list_team_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .patch(routes::projects::patch_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/users",
            get(routes::projects::list_project_members).post(routes::projects::add_project_member),
        )
        .route(
            "/projects/:id/users/:user_id",
            delete(routes::projects::remove_project_member),
        )
        .route(
            "/roles",
            get(routes::roles::list_roles).post(routes::roles::create_role),
        )
        .route("/roles/:id", delete(routes::roles::delete_role))
        .route("/audits", get(routes::audits::list_audits));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/healthz", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
