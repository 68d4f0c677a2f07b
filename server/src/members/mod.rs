//! Project Membership Module
//!
//! Membership storage, the service that authorizes and validates member
//! operations, and the HTTP endpoints nested under
//! `/api/projects/{id}/members`.

mod error;
pub mod handlers;
mod memory_store;
mod pg_store;
mod service;
mod store;
pub mod types;

use axum::routing::get;
use axum::Router;

use crate::api::AppState;

pub use error::{MemberError, MemberResult};
pub use memory_store::InMemoryStore;
pub use pg_store::PgStore;
pub use service::{MembershipService, RemovalOutcome};
pub use store::{
    Directory, Member, MemberFilter, MembershipStore, StoreError, StoreResult, Upserted,
    ValidationError,
};

/// Create the project member router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_members).post(handlers::add_member),
        )
        .route(
            "/{user_id}",
            get(handlers::get_member)
                .put(handlers::update_member)
                .delete(handlers::remove_member),
        )
}
