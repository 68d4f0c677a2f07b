//! Database Integration Tests
//!
//! Require a running `PostgreSQL` reachable through `DATABASE_URL`:
//! `cargo test -p roster-server -- --ignored`

#[cfg(test)]
mod postgres_tests {
    use super::super::*;
    use sqlx::PgPool;
    use uuid::Uuid;

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_create_and_find_user(pool: PgPool) {
        let user = create_user(&pool, "alice", "Alice", Some("alice@example.com"), false)
            .await
            .expect("Failed to create user");

        assert_eq!(user.username, "alice");
        assert!(!user.is_admin);

        let found = find_user_by_id(&pool, user.id)
            .await
            .expect("Query failed")
            .expect("User not found");
        assert_eq!(found.id, user.id);
        assert_eq!(found.email.as_deref(), Some("alice@example.com"));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_find_missing_user(pool: PgPool) {
        let found = find_user_by_id(&pool, Uuid::new_v4())
            .await
            .expect("Query failed");
        assert!(found.is_none());
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_create_and_find_project(pool: PgPool) {
        let owner = create_user(&pool, "owner", "Owner", None, false)
            .await
            .expect("Failed to create user");

        let project = create_project(&pool, "Roster", owner.id, ProjectVisibility::Internal)
            .await
            .expect("Failed to create project");

        let found = find_project_by_id(&pool, project.id)
            .await
            .expect("Query failed")
            .expect("Project not found");
        assert_eq!(found.owner_id, owner.id);
        assert_eq!(found.visibility, ProjectVisibility::Internal);
    }
}
