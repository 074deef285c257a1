use sqlx::{Pool, Sqlite};
use crate::db::models::User;
use crate::error::AppError;

/// Profile fields written when a Google account signs in.
#[derive(Debug, Clone)]
pub struct NewFederatedUser<'a> {
    pub google_id: &'a str,
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub picture: Option<&'a str>,
}

pub struct UserRepository;

impl UserRepository {
    /// Insert a local account. A clash on the local username index becomes
    /// [`AppError::DuplicateUsername`].
    pub async fn create_local(
        pool: &Pool<Sqlite>,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let created_at = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (username, password_hash, created_at)
VALUES (?, ?, ?)
RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(created_at)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::DuplicateUsername
            }
            e => AppError::Database(e),
        })?;

        Ok(user)
    }

    /// Create or refresh the account bound to a Google id.
    pub async fn upsert_federated(
        pool: &Pool<Sqlite>,
        profile: &NewFederatedUser<'_>,
    ) -> Result<User, AppError> {
        let created_at = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (username, password_hash, google_id, email, picture, created_at)
VALUES (?, NULL, ?, ?, ?, ?)
ON CONFLICT (google_id) DO UPDATE SET
    username = excluded.username,
    email = excluded.email,
    picture = excluded.picture
RETURNING *
            "#,
        )
        .bind(profile.username)
        .bind(profile.google_id)
        .bind(profile.email)
        .bind(profile.picture)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Look up a local (password) account. Google accounts share the
    /// username namespace loosely and are never returned here.
    pub async fn get_local_by_username(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = ? AND google_id IS NULL"
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        id: i64,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool::pool;

    #[tokio::test]
    async fn test_create_and_lookup_local() {
        let pool = pool().await;

        let user = UserRepository::create_local(&pool, "alice", "$argon2id$fake").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.password_hash.as_deref(), Some("$argon2id$fake"));
        assert!(user.google_id.is_none());

        let found = UserRepository::get_local_by_username(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        let by_id = UserRepository::get_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert!(UserRepository::get_by_id(&pool, user.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_local_username() {
        let pool = pool().await;

        UserRepository::create_local(&pool, "alice", "h1").await.unwrap();
        let err = UserRepository::create_local(&pool, "alice", "h2").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = 'alice'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_upsert_federated_reuses_row() {
        let pool = pool().await;

        let first = UserRepository::upsert_federated(&pool, &NewFederatedUser {
            google_id: "g-1",
            username: "Alice A",
            email: Some("alice@example.com"),
            picture: None,
        }).await.unwrap();
        assert!(first.password_hash.is_none());

        let second = UserRepository::upsert_federated(&pool, &NewFederatedUser {
            google_id: "g-1",
            username: "Alice B",
            email: Some("alice@new.example.com"),
            picture: Some("https://img.example/a.png"),
        }).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.username, "Alice B");
        assert_eq!(second.email.as_deref(), Some("alice@new.example.com"));
        assert_eq!(second.picture.as_deref(), Some("https://img.example/a.png"));
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn test_federated_user_hidden_from_local_lookup() {
        let pool = pool().await;

        UserRepository::upsert_federated(&pool, &NewFederatedUser {
            google_id: "g-2",
            username: "bob",
            email: None,
            picture: None,
        }).await.unwrap();

        assert!(UserRepository::get_local_by_username(&pool, "bob").await.unwrap().is_none());
        // A local account may still claim the name.
        let local = UserRepository::create_local(&pool, "bob", "h").await.unwrap();
        assert!(local.google_id.is_none());
        let found = UserRepository::get_local_by_username(&pool, "bob").await.unwrap().unwrap();
        assert_eq!(found.id, local.id);
    }
}
