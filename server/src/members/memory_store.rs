//! In-memory membership store.
//!
//! Backs the HTTP tests and local runs without `PostgreSQL`. Each project's
//! roster sits behind one `DashMap` entry, so the entry lock serializes
//! writers of that project.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::db::{Project, ProjectVisibility, User};
use crate::permissions::AccessLevel;

use super::store::{
    Directory, Member, MemberFilter, MembershipStore, StoreResult, Upserted, ValidationError,
};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: DashMap<Uuid, User>,
    projects: DashMap<Uuid, Project>,
    rosters: DashMap<Uuid, Vec<Member>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user.
    pub fn insert_user(&self, username: &str, is_admin: bool) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            display_name: username.to_string(),
            email: Some(format!("{username}@example.com")),
            is_admin,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        user
    }

    /// Seed a project owned by `owner_id`.
    pub fn insert_project(
        &self,
        name: &str,
        owner_id: Uuid,
        visibility: ProjectVisibility,
    ) -> Project {
        let now = Utc::now();
        let project = Project {
            id: Uuid::now_v7(),
            name: name.to_string(),
            owner_id,
            visibility,
            created_at: now,
            updated_at: now,
        };
        self.projects.insert(project.id, project.clone());
        project
    }

    fn user_snapshot(&self, user_id: Uuid) -> Result<User, ValidationError> {
        self.users
            .get(&user_id)
            .map(|user| user.value().clone())
            .ok_or(ValidationError::UnknownUser(user_id))
    }
}

#[async_trait]
impl Directory for InMemoryStore {
    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.projects.get(&project_id).map(|p| p.value().clone()))
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn list(
        &self,
        project_id: Uuid,
        filter: Option<&MemberFilter>,
    ) -> StoreResult<Vec<Member>> {
        let Some(roster) = self.rosters.get(&project_id) else {
            return Ok(Vec::new());
        };

        Ok(roster
            .iter()
            .filter(|m| filter.is_none_or(|f| f.matches(&m.username)))
            .cloned()
            .collect())
    }

    async fn get(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>> {
        Ok(self.rosters.get(&project_id).and_then(|roster| {
            roster.iter().find(|m| m.user_id == user_id).cloned()
        }))
    }

    async fn upsert(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        level: AccessLevel,
    ) -> StoreResult<Upserted> {
        if !self.projects.contains_key(&project_id) {
            return Err(ValidationError::UnknownProject(project_id).into());
        }
        let user = self.user_snapshot(user_id)?;

        let now = Utc::now();
        let mut roster = self.rosters.entry(project_id).or_default();

        if let Some(existing) = roster.iter_mut().find(|m| m.user_id == user_id) {
            existing.access_level = level;
            existing.updated_at = now;
            return Ok(Upserted::Updated(existing.clone()));
        }

        let member = Member {
            project_id,
            user_id,
            username: user.username,
            name: user.display_name,
            email: user.email,
            access_level: level,
            created_at: now,
            updated_at: now,
        };
        roster.push(member.clone());
        Ok(Upserted::Created(member))
    }

    async fn update(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        level: AccessLevel,
    ) -> StoreResult<Option<Member>> {
        let Some(mut roster) = self.rosters.get_mut(&project_id) else {
            return Ok(None);
        };

        Ok(roster
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .map(|member| {
                member.access_level = level;
                member.updated_at = Utc::now();
                member.clone()
            }))
    }

    async fn remove(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>> {
        let Some(mut roster) = self.rosters.get_mut(&project_id) else {
            return Ok(None);
        };

        let index = roster.iter().position(|m| m.user_id == user_id);
        Ok(index.map(|index| roster.remove(index)))
    }
}
