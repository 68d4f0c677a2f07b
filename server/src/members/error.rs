//! Member Operation Errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::permissions::{InvalidAccessLevel, PermissionError};

use super::store::{StoreError, ValidationError};

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("Project not found")]
    ProjectNotFound,

    /// Missing member, or a write the store rejected as invalid.
    #[error("{0}")]
    NotFound(String),

    #[error("Managing project members requires master access")]
    Forbidden,

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Access level {0} is not recognized")]
    InvalidAccessLevel(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl MemberError {
    /// The member lookup for `user_id` came back empty.
    #[must_use]
    pub fn member_not_found(user_id: Uuid) -> Self {
        Self::NotFound(format!("User {user_id} is not a member of this project"))
    }

    /// Surface a store validation failure.
    ///
    /// Access level rejections keep their own class. Every other validation
    /// failure is reported as not found with the failure as detail.
    #[must_use]
    pub fn from_validation(err: ValidationError) -> Self {
        match err {
            ValidationError::AccessLevel(value) => Self::InvalidAccessLevel(value.to_string()),
            ValidationError::UnknownProject(_) => Self::ProjectNotFound,
            other @ (ValidationError::UnknownUser(_) | ValidationError::MalformedUser(_)) => {
                Self::NotFound(other.to_string())
            }
        }
    }
}

impl From<StoreError> for MemberError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(validation) => Self::from_validation(validation),
            other => Self::Store(other),
        }
    }
}

impl From<InvalidAccessLevel> for MemberError {
    fn from(err: InvalidAccessLevel) -> Self {
        Self::InvalidAccessLevel(err.0.to_string())
    }
}

impl From<PermissionError> for MemberError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::NotVisible => Self::ProjectNotFound,
            PermissionError::Forbidden => Self::Forbidden,
            PermissionError::Store(store) => store.into(),
        }
    }
}

impl IntoResponse for MemberError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::ProjectNotFound => (StatusCode::NOT_FOUND, "PROJECT_NOT_FOUND"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::MissingParameter(_) => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            Self::InvalidAccessLevel(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ACCESS_LEVEL")
            }
            Self::Store(err) => {
                tracing::error!(%err, "Member endpoint store error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "INTERNAL_ERROR", "message": "Database error" })),
                )
                    .into_response();
            }
        };

        (
            status,
            Json(json!({ "error": code, "message": self.to_string() })),
        )
            .into_response()
    }
}

pub type MemberResult<T> = Result<T, MemberError>;
