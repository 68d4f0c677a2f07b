//! Member Request and Response Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::store::Member;

// ============================================================================
// Request Types
// ============================================================================

/// Body of an add-member request.
///
/// Fields are type-checked by the service after authorization. Codes may
/// be sent as numbers or numeric strings.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct AddMemberRequest {
    #[schema(value_type = Option<String>, format = Uuid)]
    pub user_id: Option<Value>,
    /// Access level code (10, 20, 30, 40 or 50).
    #[schema(value_type = Option<i64>)]
    pub access_level: Option<Value>,
}

impl AddMemberRequest {
    /// Read a request body. Anything that is not a JSON object reads as
    /// an empty request.
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateMemberRequest {
    /// Access level code (10, 20, 30, 40 or 50).
    #[schema(value_type = Option<i64>)]
    pub access_level: Option<Value>,
}

impl UpdateMemberRequest {
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MemberListQuery {
    /// Substring of the member's username.
    pub query: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// A project member as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MemberView {
    /// User ID of the member.
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub access_level: i32,
    pub access_level_name: String,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Member> for MemberView {
    fn from(member: Member) -> Self {
        Self {
            id: member.user_id,
            username: member.username,
            name: member.name,
            email: member.email,
            access_level: member.access_level.as_i32(),
            access_level_name: member.access_level.name().to_string(),
            created_at: member.created_at,
            updated_at: member.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RemoveMemberResponse {
    /// Whether a membership was deleted.
    pub removed: bool,
    pub user_id: Uuid,
    pub message: String,
}
