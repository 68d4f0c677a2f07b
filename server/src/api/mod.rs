//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{
    auth,
    config::Config,
    members::{self, Directory, MembershipService, MembershipStore},
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Member operations
    pub members: Arc<MembershipService>,
    /// User and project lookups
    pub directory: Arc<dyn Directory>,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn MembershipStore>,
        directory: Arc<dyn Directory>,
        config: Config,
    ) -> Self {
        let members = MembershipService::new(
            store,
            Arc::clone(&directory),
            config.member_query_case_insensitive,
        );

        Self {
            members: Arc::new(members),
            directory,
            config: Arc::new(config),
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Protected routes that require authentication
    let protected_routes = Router::new()
        .nest("/api/projects/{id}/members", members::router())
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(protected_routes)
        // API documentation
        .route("/api-docs/openapi.json", get(openapi_json))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Roster API", description = "Project membership and access levels"),
    paths(
        members::handlers::list_members,
        members::handlers::get_member,
        members::handlers::add_member,
        members::handlers::update_member,
        members::handlers::remove_member,
    ),
    components(schemas(
        members::types::AddMemberRequest,
        members::types::UpdateMemberRequest,
        members::types::MemberView,
        members::types::RemoveMemberResponse,
    )),
    modifiers(&BearerAuth),
    tags((name = "members", description = "Project membership management"))
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
