//! `PostgreSQL` membership store.
//!
//! Every operation is a single statement, so uniqueness of
//! `(project_id, user_id)` is enforced by the table constraint and
//! concurrent upserts resolve through `ON CONFLICT`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::{self, Project, User};
use crate::permissions::AccessLevel;

use super::store::{
    Directory, Member, MemberFilter, MembershipStore, StoreError, StoreResult, Upserted,
    ValidationError,
};

const USER_FK: &str = "project_members_user_id_fkey";
const ACCESS_LEVEL_CHECK: &str = "project_members_access_level_check";

#[derive(Debug, FromRow)]
struct MemberRow {
    project_id: Uuid,
    user_id: Uuid,
    username: String,
    display_name: String,
    email: Option<String>,
    access_level: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = StoreError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let access_level = AccessLevel::try_from(row.access_level)
            .map_err(|_| StoreError::CorruptAccessLevel(row.access_level))?;

        Ok(Self {
            project_id: row.project_id,
            user_id: row.user_id,
            username: row.username,
            name: row.display_name,
            email: row.email,
            access_level,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    member: MemberRow,
    inserted: bool,
}

/// Membership store backed by the `project_members` table.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map constraint violations raised by a membership write.
///
/// A foreign key violation on anything but the user key means the project
/// row is gone.
fn classify_write_error(
    err: sqlx::Error,
    project_id: Uuid,
    user_id: Uuid,
    level: i32,
) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_foreign_key_violation() {
            let validation = match db_err.constraint() {
                Some(USER_FK) => ValidationError::UnknownUser(user_id),
                _ => ValidationError::UnknownProject(project_id),
            };
            return validation.into();
        }
        if db_err.is_check_violation() && db_err.constraint() == Some(ACCESS_LEVEL_CHECK) {
            return ValidationError::AccessLevel(i64::from(level)).into();
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Directory for PgStore {
    async fn find_project(&self, project_id: Uuid) -> StoreResult<Option<Project>> {
        Ok(db::find_project_by_id(&self.pool, project_id).await?)
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(db::find_user_by_id(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    async fn list(
        &self,
        project_id: Uuid,
        filter: Option<&MemberFilter>,
    ) -> StoreResult<Vec<Member>> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r"
            SELECT pm.project_id, pm.user_id, u.username, u.display_name, u.email,
                   pm.access_level, pm.created_at, pm.updated_at
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = ",
        );
        query.push_bind(project_id);

        if let Some(filter) = filter {
            query.push(if filter.case_insensitive {
                " AND u.username ILIKE "
            } else {
                " AND u.username LIKE "
            });
            query.push_bind(filter.like_pattern());
            query.push(r" ESCAPE '\'");
        }
        query.push(" ORDER BY pm.id");

        let rows = query
            .build_query_as::<MemberRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error!("list_project_members", project_id = %project_id))?;

        rows.into_iter().map(Member::try_from).collect()
    }

    async fn get(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r"
            SELECT pm.project_id, pm.user_id, u.username, u.display_name, u.email,
                   pm.access_level, pm.created_at, pm.updated_at
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = $1 AND pm.user_id = $2
            ",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("get_project_member", project_id = %project_id, user_id = %user_id))?;

        row.map(Member::try_from).transpose()
    }

    async fn upsert(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        level: AccessLevel,
    ) -> StoreResult<Upserted> {
        // xmax is zero only for freshly inserted tuples
        let row = sqlx::query_as::<_, UpsertRow>(
            r"
            WITH upserted AS (
                INSERT INTO project_members (project_id, user_id, access_level)
                VALUES ($1, $2, $3)
                ON CONFLICT (project_id, user_id) DO UPDATE
                    SET access_level = EXCLUDED.access_level, updated_at = NOW()
                RETURNING project_id, user_id, access_level, created_at, updated_at,
                          (xmax = 0) AS inserted
            )
            SELECT up.project_id, up.user_id, u.username, u.display_name, u.email,
                   up.access_level, up.created_at, up.updated_at, up.inserted
            FROM upserted up
            JOIN users u ON u.id = up.user_id
            ",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(level.as_i32())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error!("upsert_project_member", project_id = %project_id, user_id = %user_id))
        .map_err(|e| classify_write_error(e, project_id, user_id, level.as_i32()))?;

        let inserted = row.inserted;
        let member = Member::try_from(row.member)?;
        Ok(if inserted {
            Upserted::Created(member)
        } else {
            Upserted::Updated(member)
        })
    }

    async fn update(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        level: AccessLevel,
    ) -> StoreResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r"
            WITH updated AS (
                UPDATE project_members
                SET access_level = $3, updated_at = NOW()
                WHERE project_id = $1 AND user_id = $2
                RETURNING project_id, user_id, access_level, created_at, updated_at
            )
            SELECT up.project_id, up.user_id, u.username, u.display_name, u.email,
                   up.access_level, up.created_at, up.updated_at
            FROM updated up
            JOIN users u ON u.id = up.user_id
            ",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(level.as_i32())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("update_project_member", project_id = %project_id, user_id = %user_id))?;

        row.map(Member::try_from).transpose()
    }

    async fn remove(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r"
            WITH removed AS (
                DELETE FROM project_members
                WHERE project_id = $1 AND user_id = $2
                RETURNING project_id, user_id, access_level, created_at, updated_at
            )
            SELECT rm.project_id, rm.user_id, u.username, u.display_name, u.email,
                   rm.access_level, rm.created_at, rm.updated_at
            FROM removed rm
            JOIN users u ON u.id = rm.user_id
            ",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error!("remove_project_member", project_id = %project_id, user_id = %user_id))?;

        row.map(Member::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ProjectVisibility;

    async fn seed(pool: &PgPool) -> (PgStore, Project, User) {
        let owner = db::create_user(pool, "owner", "Owner", None, false)
            .await
            .unwrap();
        let project = db::create_project(pool, "roster", owner.id, ProjectVisibility::Private)
            .await
            .unwrap();
        (PgStore::new(pool.clone()), project, owner)
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_upsert_reports_created_then_updated(pool: PgPool) {
        let (store, project, _) = seed(&pool).await;
        let alice = db::create_user(&pool, "alice", "Alice", None, false)
            .await
            .unwrap();

        let first = store
            .upsert(project.id, alice.id, AccessLevel::Developer)
            .await
            .unwrap();
        assert!(first.is_created());

        let second = store
            .upsert(project.id, alice.id, AccessLevel::Master)
            .await
            .unwrap();
        assert!(!second.is_created());
        let member = second.into_member();
        assert_eq!(member.access_level, AccessLevel::Master);
        assert_eq!(member.username, "alice");
        assert_eq!(member.name, "Alice");
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_upsert_unknown_user_is_validation_error(pool: PgPool) {
        let (store, project, _) = seed(&pool).await;
        let missing = Uuid::new_v4();

        let err = store
            .upsert(project.id, missing, AccessLevel::Guest)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::UnknownUser(id)) if id == missing
        ));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_list_filter_escapes_wildcards(pool: PgPool) {
        let (store, project, _) = seed(&pool).await;
        for name in ["a_b", "axb", "Alice"] {
            let user = db::create_user(&pool, name, name, None, false)
                .await
                .unwrap();
            store
                .upsert(project.id, user.id, AccessLevel::Guest)
                .await
                .unwrap();
        }

        let filter = MemberFilter::new("a_b", false);
        let matched = store.list(project.id, Some(&filter)).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].username, "a_b");

        let filter = MemberFilter::new("ali", true);
        let matched = store.list(project.id, Some(&filter)).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].username, "Alice");

        let all = store.list(project.id, None).await.unwrap();
        let names: Vec<_> = all.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, ["a_b", "axb", "Alice"]);
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_update_and_remove(pool: PgPool) {
        let (store, project, _) = seed(&pool).await;
        let bob = db::create_user(&pool, "bob", "Bob", None, false)
            .await
            .unwrap();

        assert!(store
            .update(project.id, bob.id, AccessLevel::Master)
            .await
            .unwrap()
            .is_none());

        store
            .upsert(project.id, bob.id, AccessLevel::Guest)
            .await
            .unwrap();
        let updated = store
            .update(project.id, bob.id, AccessLevel::Reporter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.access_level, AccessLevel::Reporter);

        let removed = store.remove(project.id, bob.id).await.unwrap().unwrap();
        assert_eq!(removed.user_id, bob.id);
        assert!(store.remove(project.id, bob.id).await.unwrap().is_none());
    }
}
