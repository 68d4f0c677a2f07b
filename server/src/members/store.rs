//! Membership storage contract.
//!
//! Two implementations live alongside: [`PgStore`](super::PgStore) for
//! production and [`InMemoryStore`](super::InMemoryStore) for tests and
//! local development. Both must keep single-operation atomicity: no two
//! members of a project share a `user_id`, and concurrent upserts for the
//! same pair end with exactly one row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{Project, User};
use crate::permissions::AccessLevel;

// ============================================================================
// Entities
// ============================================================================

/// A user's membership in a project, with identity fields of the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    /// Display name of the user.
    pub name: String,
    pub email: Option<String>,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an upsert: whether a new member row was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted {
    Created(Member),
    Updated(Member),
}

impl Upserted {
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    #[must_use]
    pub fn into_member(self) -> Member {
        match self {
            Self::Created(member) | Self::Updated(member) => member,
        }
    }
}

/// Username substring filter for member listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFilter {
    pub query: String,
    pub case_insensitive: bool,
}

impl MemberFilter {
    #[must_use]
    pub fn new(query: impl Into<String>, case_insensitive: bool) -> Self {
        Self {
            query: query.into(),
            case_insensitive,
        }
    }

    /// Whether `username` contains the query.
    #[must_use]
    pub fn matches(&self, username: &str) -> bool {
        if self.case_insensitive {
            username
                .to_lowercase()
                .contains(&self.query.to_lowercase())
        } else {
            username.contains(&self.query)
        }
    }

    /// SQL `LIKE` pattern matching the query as a literal substring.
    #[must_use]
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.query.len() + 2);
        pattern.push('%');
        for c in self.query.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Rejections of a write that the store detected itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("User {0} does not exist")]
    UnknownUser(Uuid),

    #[error("User {0} does not exist")]
    MalformedUser(String),

    #[error("Project {0} does not exist")]
    UnknownProject(Uuid),

    #[error("Access level {0} is not recognized")]
    AccessLevel(i64),
}

/// Membership store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A stored row carries a level outside the recognized set.
    #[error("Stored access level {0} is not recognized")]
    CorruptAccessLevel(i32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Traits
// ============================================================================

/// Lookups of the projects and users that memberships refer to.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<Project>>;

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;
}

/// Persistence of project memberships.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Members of a project in stable insertion order, optionally filtered
    /// by username substring.
    async fn list(
        &self,
        project_id: Uuid,
        filter: Option<&MemberFilter>,
    ) -> StoreResult<Vec<Member>>;

    async fn get(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>>;

    /// Insert a membership, or set the level of the existing one.
    async fn upsert(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        level: AccessLevel,
    ) -> StoreResult<Upserted>;

    /// Set the level of an existing membership. `None` if there is none.
    async fn update(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        level: AccessLevel,
    ) -> StoreResult<Option<Member>>;

    /// Delete a membership. `None` if there was none.
    async fn remove(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>>;
}
