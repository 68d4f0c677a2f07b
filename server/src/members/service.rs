//! Membership Service
//!
//! Orchestrates project lookup, authorization, request validation and
//! persistence for every member operation. Each operation runs in a fixed
//! order: project lookup, authorization, required fields, access level
//! validation, then the store call. Nothing is written before all checks
//! pass.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::db::Project;
use crate::permissions::{AccessLevel, Actor, AuthorizationGuard, MemberAction};

use super::error::{MemberError, MemberResult};
use super::store::{
    Directory, Member, MemberFilter, MembershipStore, Upserted, ValidationError,
};
use super::types::{AddMemberRequest, UpdateMemberRequest};

/// Outcome of a remove request. Removing a non-member succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed(Member),
    NotMember { user_id: Uuid },
}

impl RemovalOutcome {
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        matches!(self, Self::Removed(_))
    }

    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        match self {
            Self::Removed(member) => member.user_id,
            Self::NotMember { user_id } => *user_id,
        }
    }
}

#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn MembershipStore>,
    directory: Arc<dyn Directory>,
    guard: AuthorizationGuard,
    case_insensitive_query: bool,
}

impl MembershipService {
    #[must_use]
    pub fn new(
        store: Arc<dyn MembershipStore>,
        directory: Arc<dyn Directory>,
        case_insensitive_query: bool,
    ) -> Self {
        let guard = AuthorizationGuard::new(Arc::clone(&store));
        Self {
            store,
            directory,
            guard,
            case_insensitive_query,
        }
    }

    async fn authorized_project(
        &self,
        actor: &Actor,
        project_id: Uuid,
        action: MemberAction,
    ) -> MemberResult<Project> {
        let project = self
            .directory
            .find_project(project_id)
            .await?
            .ok_or(MemberError::ProjectNotFound)?;

        self.guard.authorize(actor, &project, action).await?;
        Ok(project)
    }

    /// List members in insertion order, optionally filtered by username.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn list(
        &self,
        actor: &Actor,
        project_id: Uuid,
        query: Option<&str>,
    ) -> MemberResult<Vec<Member>> {
        let project = self
            .authorized_project(actor, project_id, MemberAction::Read)
            .await?;

        let filter = query
            .filter(|q| !q.is_empty())
            .map(|q| MemberFilter::new(q, self.case_insensitive_query));

        Ok(self.store.list(project.id, filter.as_ref()).await?)
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn get(
        &self,
        actor: &Actor,
        project_id: Uuid,
        user_id: Uuid,
    ) -> MemberResult<Member> {
        let project = self
            .authorized_project(actor, project_id, MemberAction::Read)
            .await?;

        self.store
            .get(project.id, user_id)
            .await?
            .ok_or_else(|| MemberError::member_not_found(user_id))
    }

    /// Add a member, or change the level of an existing one.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn add(
        &self,
        actor: &Actor,
        project_id: Uuid,
        request: &AddMemberRequest,
    ) -> MemberResult<Upserted> {
        let project = self
            .authorized_project(actor, project_id, MemberAction::Admin)
            .await?;

        let user_id = require(request.user_id.as_ref(), "user_id")?;
        let raw_level = require(request.access_level.as_ref(), "access_level")?;
        let user_id = parse_user_id(user_id)?;
        let level = parse_access_level(raw_level)?;

        let upserted = self.store.upsert(project.id, user_id, level).await?;

        info!(
            project_id = %project.id,
            user_id = %user_id,
            access_level = level.as_i32(),
            created = upserted.is_created(),
            "Project member saved"
        );
        Ok(upserted)
    }

    /// Change the level of an existing member. Never creates one.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn update(
        &self,
        actor: &Actor,
        project_id: Uuid,
        user_id: Uuid,
        request: &UpdateMemberRequest,
    ) -> MemberResult<Member> {
        let project = self
            .authorized_project(actor, project_id, MemberAction::Admin)
            .await?;

        let raw_level = require(request.access_level.as_ref(), "access_level")?;

        if self.store.get(project.id, user_id).await?.is_none() {
            return Err(MemberError::member_not_found(user_id));
        }
        let level = parse_access_level(raw_level)?;

        // The member may have been removed since the lookup
        let member = self
            .store
            .update(project.id, user_id, level)
            .await?
            .ok_or_else(|| MemberError::member_not_found(user_id))?;

        info!(
            project_id = %project.id,
            user_id = %user_id,
            access_level = level.as_i32(),
            "Project member updated"
        );
        Ok(member)
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn remove(
        &self,
        actor: &Actor,
        project_id: Uuid,
        user_id: Uuid,
    ) -> MemberResult<RemovalOutcome> {
        let project = self
            .authorized_project(actor, project_id, MemberAction::Admin)
            .await?;

        match self.store.remove(project.id, user_id).await? {
            Some(member) => {
                info!(project_id = %project.id, user_id = %user_id, "Project member removed");
                Ok(RemovalOutcome::Removed(member))
            }
            None => Ok(RemovalOutcome::NotMember { user_id }),
        }
    }
}

/// Require a request field to be present. JSON `null` counts as absent.
fn require<'a>(value: Option<&'a Value>, name: &'static str) -> MemberResult<&'a Value> {
    value
        .filter(|v| !v.is_null())
        .ok_or(MemberError::MissingParameter(name))
}

/// A user id must be a UUID string; anything else names no user.
fn parse_user_id(value: &Value) -> MemberResult<Uuid> {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| {
            let raw = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            MemberError::from_validation(ValidationError::MalformedUser(raw))
        })
}

/// Accepts an integer code or a string holding one, e.g. `30` or `"30"`.
fn parse_access_level(value: &Value) -> MemberResult<AccessLevel> {
    let code = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match code {
        Some(code) => Ok(AccessLevel::validate(code)?),
        None => Err(MemberError::InvalidAccessLevel(
            value.as_str().map_or_else(|| value.to_string(), str::to_string),
        )),
    }
}
