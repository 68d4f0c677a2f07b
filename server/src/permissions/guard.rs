//! Authorization for project membership operations.
//!
//! Reads need visibility of the project. Mutations (add, update, remove)
//! need an administrative relationship: global admin, project owner, or a
//! Master/Owner membership.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::db::{Project, ProjectVisibility};
use crate::members::{MembershipStore, StoreError};

use super::access_level::AccessLevel;

/// The authenticated caller of a membership operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID of the caller.
    pub id: Uuid,
    /// Global admins may manage every project.
    pub is_admin: bool,
}

/// Kind of membership operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAction {
    /// List or get members.
    Read,
    /// Add, update or remove members.
    Admin,
}

/// Authorization failures.
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    /// The project is not visible to the actor.
    #[error("Project not found")]
    NotVisible,

    /// The actor lacks administrative access to the project.
    #[error("Managing project members requires master access")]
    Forbidden,

    /// Looking up the actor's membership failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Resolved relationship between an actor and one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectAccess {
    pub is_admin: bool,
    pub is_owner: bool,
    pub visibility: ProjectVisibility,
    /// The actor's own membership level, if any.
    pub actor_level: Option<AccessLevel>,
}

impl ProjectAccess {
    #[must_use]
    pub fn resolve(actor: &Actor, project: &Project, actor_level: Option<AccessLevel>) -> Self {
        Self {
            is_admin: actor.is_admin,
            is_owner: project.owner_id == actor.id,
            visibility: project.visibility,
            actor_level,
        }
    }

    #[must_use]
    pub const fn can_read(&self) -> bool {
        self.is_admin
            || self.is_owner
            || self.actor_level.is_some()
            || self.visibility.readable_by_non_members()
    }

    #[must_use]
    pub fn can_administer(&self) -> bool {
        self.is_admin
            || self.is_owner
            || self
                .actor_level
                .is_some_and(AccessLevel::can_manage_members)
    }

    /// Check an action against this access.
    ///
    /// Admin actions fail with `Forbidden` whether or not the project is
    /// visible, so the payload is never examined for unauthorized actors.
    pub fn check(&self, action: MemberAction) -> Result<(), PermissionError> {
        match action {
            MemberAction::Read if self.can_read() => Ok(()),
            MemberAction::Read => Err(PermissionError::NotVisible),
            MemberAction::Admin if self.can_administer() => Ok(()),
            MemberAction::Admin => Err(PermissionError::Forbidden),
        }
    }
}

/// Decides whether an actor may perform a membership action on a project.
#[derive(Clone)]
pub struct AuthorizationGuard {
    store: Arc<dyn MembershipStore>,
}

impl AuthorizationGuard {
    #[must_use]
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Authorize `action` by `actor` on `project`.
    ///
    /// Must run before any store mutation.
    #[tracing::instrument(skip(self, project), fields(project_id = %project.id))]
    pub async fn authorize(
        &self,
        actor: &Actor,
        project: &Project,
        action: MemberAction,
    ) -> Result<(), PermissionError> {
        // Admins and owners need no membership lookup
        let actor_level = if actor.is_admin || project.owner_id == actor.id {
            None
        } else {
            self.store
                .get(project.id, actor.id)
                .await?
                .map(|member| member.access_level)
        };

        let access = ProjectAccess::resolve(actor, project, actor_level);
        access.check(action).inspect_err(|err| {
            warn!(
                actor_id = %actor.id,
                project_id = %project.id,
                ?action,
                error = %err,
                "Membership action denied"
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(owner_id: Uuid, visibility: ProjectVisibility) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: "roster".into(),
            owner_id,
            visibility,
            created_at: now,
            updated_at: now,
        }
    }

    fn actor(is_admin: bool) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            is_admin,
        }
    }

    #[test]
    fn test_owner_can_administer() {
        let owner = actor(false);
        let p = project(owner.id, ProjectVisibility::Private);
        let access = ProjectAccess::resolve(&owner, &p, None);

        assert!(access.is_owner);
        assert!(access.check(MemberAction::Read).is_ok());
        assert!(access.check(MemberAction::Admin).is_ok());
    }

    #[test]
    fn test_global_admin_can_administer_any_project() {
        let admin = actor(true);
        let p = project(Uuid::new_v4(), ProjectVisibility::Private);
        let access = ProjectAccess::resolve(&admin, &p, None);

        assert!(access.check(MemberAction::Read).is_ok());
        assert!(access.check(MemberAction::Admin).is_ok());
    }

    #[test]
    fn test_master_member_can_administer() {
        let member = actor(false);
        let p = project(Uuid::new_v4(), ProjectVisibility::Private);

        for level in [AccessLevel::Master, AccessLevel::Owner] {
            let access = ProjectAccess::resolve(&member, &p, Some(level));
            assert!(access.check(MemberAction::Admin).is_ok(), "{level} should administer");
        }
    }

    #[test]
    fn test_lower_members_are_forbidden() {
        let member = actor(false);
        let p = project(Uuid::new_v4(), ProjectVisibility::Private);

        for level in [
            AccessLevel::Guest,
            AccessLevel::Reporter,
            AccessLevel::Developer,
        ] {
            let access = ProjectAccess::resolve(&member, &p, Some(level));
            assert!(access.check(MemberAction::Read).is_ok());
            assert!(matches!(
                access.check(MemberAction::Admin),
                Err(PermissionError::Forbidden)
            ));
        }
    }

    #[test]
    fn test_private_project_hidden_from_non_members() {
        let stranger = actor(false);
        let p = project(Uuid::new_v4(), ProjectVisibility::Private);
        let access = ProjectAccess::resolve(&stranger, &p, None);

        assert!(matches!(
            access.check(MemberAction::Read),
            Err(PermissionError::NotVisible)
        ));
        assert!(matches!(
            access.check(MemberAction::Admin),
            Err(PermissionError::Forbidden)
        ));
    }

    #[test]
    fn test_internal_and_public_projects_readable_by_non_members() {
        let stranger = actor(false);

        for visibility in [ProjectVisibility::Internal, ProjectVisibility::Public] {
            let p = project(Uuid::new_v4(), visibility);
            let access = ProjectAccess::resolve(&stranger, &p, None);
            assert!(access.check(MemberAction::Read).is_ok());
            assert!(matches!(
                access.check(MemberAction::Admin),
                Err(PermissionError::Forbidden)
            ));
        }
    }
}
