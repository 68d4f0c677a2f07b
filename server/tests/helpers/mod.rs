//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router, backed by an [`InMemoryStore`] so no database is required, plus
//! utilities for seeding users and projects and for JWT generation.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use roster_server::api::{create_router, AppState};
use roster_server::auth::jwt;
use roster_server::config::Config;
use roster_server::db::{Project, ProjectVisibility, User};
use roster_server::members::InMemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a new test app with the default test config.
    pub fn new() -> Self {
        Self::with_config(Config::default_for_test())
    }

    /// Create a test app with a custom config.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(store.clone(), store.clone(), config.clone());
        let router = create_router(state);

        Self {
            router,
            store,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Build an authenticated request for `user`, with an optional JSON body.
    pub fn authed(
        &self,
        method: Method,
        uri: &str,
        user: &User,
        body: Option<serde_json::Value>,
    ) -> Request<Body> {
        let token = generate_access_token(&self.config, user.id);
        let builder = Self::request(method, uri).header("Authorization", format!("Bearer {token}"));

        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Seed a regular user.
    pub fn user(&self, username: &str) -> User {
        self.store.insert_user(username, false)
    }

    /// Seed a global admin.
    pub fn admin(&self, username: &str) -> User {
        self.store.insert_user(username, true)
    }

    /// Seed a project owned by `owner`.
    pub fn project(&self, owner: &User, visibility: ProjectVisibility) -> Project {
        self.store.insert_project("test-project", owner.id, visibility)
    }
}

// ============================================================================
// Auth & response helpers
// ============================================================================

/// Generate an access token for the given user.
pub fn generate_access_token(config: &Config, user_id: Uuid) -> String {
    jwt::generate_access_token(user_id, &config.jwt_secret, config.jwt_access_expiry)
        .expect("Failed to generate access token")
}

/// Members collection URI for a project.
pub fn members_uri(project_id: Uuid) -> String {
    format!("/api/projects/{project_id}/members")
}

/// Single member URI.
pub fn member_uri(project_id: Uuid, user_id: Uuid) -> String {
    format!("/api/projects/{project_id}/members/{user_id}")
}

/// Read a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
