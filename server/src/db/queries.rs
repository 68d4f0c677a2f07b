//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! All query functions include error context logging to aid debugging.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Project, ProjectVisibility, User};

// ============================================================================
// User Queries
// ============================================================================

/// Find user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, display_name, email, is_admin, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("find_user_by_id", user_id = %id))
}

/// Create a new user.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    display_name: &str,
    email: Option<&str>,
    is_admin: bool,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (username, display_name, email, is_admin)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, display_name, email, is_admin, created_at, updated_at
        ",
    )
    .bind(username)
    .bind(display_name)
    .bind(email)
    .bind(is_admin)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_user", username = %username))
}

// ============================================================================
// Project Queries
// ============================================================================

/// Find project by ID.
pub async fn find_project_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Project>> {
    sqlx::query_as::<_, Project>(
        "SELECT id, name, owner_id, visibility, created_at, updated_at FROM projects WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("find_project_by_id", project_id = %id))
}

/// Create a new project.
pub async fn create_project(
    pool: &PgPool,
    name: &str,
    owner_id: Uuid,
    visibility: ProjectVisibility,
) -> sqlx::Result<Project> {
    sqlx::query_as::<_, Project>(
        r"
        INSERT INTO projects (name, owner_id, visibility)
        VALUES ($1, $2, $3)
        RETURNING id, name, owner_id, visibility, created_at, updated_at
        ",
    )
    .bind(name)
    .bind(owner_id)
    .bind(visibility)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_project", owner_id = %owner_id))
}
