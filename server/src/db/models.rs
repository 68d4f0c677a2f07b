//! Database Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    /// Global override: admins may manage members of any project.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub visibility: ProjectVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who can see a project without being a member of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectVisibility {
    /// Members only.
    Private,
    /// Any authenticated user.
    Internal,
    /// Everyone.
    Public,
}

impl ProjectVisibility {
    /// Whether an authenticated non-member may read the project.
    #[must_use]
    pub const fn readable_by_non_members(self) -> bool {
        matches!(self, Self::Internal | Self::Public)
    }
}
