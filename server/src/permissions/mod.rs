//! Permission system types and utilities.
//!
//! - Access levels: ordered role strengths held by project members
//! - Guard: who may read or manage a project's members

pub mod access_level;
pub mod guard;

pub use access_level::{AccessLevel, InvalidAccessLevel};
pub use guard::{Actor, AuthorizationGuard, MemberAction, PermissionError, ProjectAccess};
