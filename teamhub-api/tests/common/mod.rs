//! Shared harness for integration tests.
//!
//! Each test builds its own app over a freshly seeded engine and drives
//! it through `tower::ServiceExt::oneshot`, so no port is bound and tests
//! can run in parallel.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use teamhub_api::{
    app::{build_router, AppState},
    config::{ApiConfig, AuthConfig, Config},
};
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Builds an app over a freshly seeded engine
    pub fn new() -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            auth: AuthConfig {
                admin_password: "admin".to_string(),
                session_ttl_hours: 24,
            },
        };
        let state = AppState::new(config).expect("app state builds");
        TestApp {
            router: build_router(state),
        }
    }

    /// Sends one request; returns status, parsed JSON body, and any
    /// session token set by the response
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value, Option<String>) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = session {
            builder = builder.header(header::COOKIE, format!("session={}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request is handled");

        let status = response.status();
        let token = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .and_then(|v| v.strip_prefix("session="))
            .map(|v| v.to_string());

        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body is readable")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is JSON")
        };

        (status, body, token)
    }

    pub async fn get(&self, path: &str, session: &str) -> (StatusCode, Value) {
        let (status, body, _) = self.request(Method::GET, path, Some(session), None).await;
        (status, body)
    }

    pub async fn post(&self, path: &str, session: &str, body: Value) -> (StatusCode, Value) {
        let (status, body, _) = self
            .request(Method::POST, path, Some(session), Some(body))
            .await;
        (status, body)
    }

    pub async fn delete(&self, path: &str, session: &str) -> (StatusCode, Value) {
        let (status, body, _) = self
            .request(Method::DELETE, path, Some(session), None)
            .await;
        (status, body)
    }

    /// Logs in and returns the session token; panics on failure
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, _, token) = self
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login should succeed");
        token.expect("login sets the session cookie")
    }

    /// Logs the seeded admin in and completes the forced password change
    pub async fn admin_session(&self) -> String {
        let token = self.login("admin", "admin").await;
        let (status, _, _) = self
            .request(
                Method::PUT,
                "/api/me/password",
                Some(&token),
                Some(json!({ "old_password": "admin", "new_password": "admin123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin password change should succeed");
        self.login("admin", "admin123").await
    }

    /// Creates a user through the admin, clears the forced password
    /// change, and returns the user's ID and a live session
    pub async fn setup_user(&self, admin: &str, username: &str) -> (i64, String) {
        let (status, body) = self
            .post(
                "/api/users",
                admin,
                json!({ "username": username, "password": "initial123" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "user creation should succeed");
        let id = body["id"].as_i64().expect("user has an id");

        let token = self.login(username, "initial123").await;
        let (status, _, _) = self
            .request(
                Method::PUT,
                "/api/me/password",
                Some(&token),
                Some(json!({ "old_password": "initial123", "new_password": "changed123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "password change should succeed");
        (id, self.login(username, "changed123").await)
    }

    /// Creates a team as admin and returns its ID
    pub async fn create_team(&self, admin: &str, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/teams", admin, json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::OK, "team creation should succeed");
        body["id"].as_i64().expect("team has an id")
    }

    /// Adds a user to a team as admin
    pub async fn add_to_team(&self, admin: &str, team_id: i64, user_id: i64) {
        let (status, _) = self
            .post(
                &format!("/api/teams/{}/users", team_id),
                admin,
                json!({ "id": user_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "adding a member should succeed");
    }
}
