use sqlx::{Pool, Sqlite};

use crate::db::{NewFederatedUser, User, UserRepository};
use crate::error::AppError;

/// Identity returned by an external provider after a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct FederatedProfile {
    pub provider_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub picture: Option<String>,
}

/// Find or create the local account for a provider identity.
///
/// A known provider id gets its username, email and picture refreshed from the
/// incoming profile; an unseen one gets a new row with no password hash.
pub async fn upsert_from_provider(
    pool: &Pool<Sqlite>,
    profile: &FederatedProfile,
) -> Result<User, AppError> {
    let user = UserRepository::upsert_federated(
        pool,
        &NewFederatedUser {
            google_id: &profile.provider_id,
            username: &profile.display_name,
            email: profile.email.as_deref(),
            picture: profile.picture.as_deref(),
        },
    )
    .await?;

    tracing::debug!("Federated user {} resolved to id {}", profile.provider_id, user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool::pool;

    fn profile(id: &str, name: &str) -> FederatedProfile {
        FederatedProfile {
            provider_id: id.to_string(),
            display_name: name.to_string(),
            email: Some(format!("{}@example.com", id)),
            picture: None,
        }
    }

    async fn user_count(pool: &Pool<Sqlite>) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_login_creates_one_user() {
        let pool = pool().await;

        let user = upsert_from_provider(&pool, &profile("111", "Ana")).await.unwrap();
        assert_eq!(user.google_id.as_deref(), Some("111"));
        assert_eq!(user.username, "Ana");
        assert!(user.password_hash.is_none());
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_repeat_login_reuses_and_refreshes() {
        let pool = pool().await;

        let first = upsert_from_provider(&pool, &profile("111", "Ana")).await.unwrap();
        let mut updated = profile("111", "Ana Maria");
        updated.email = Some("ana.maria@example.com".to_string());
        updated.picture = Some("https://img.example/ana.png".to_string());
        let second = upsert_from_provider(&pool, &updated).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.username, "Ana Maria");
        assert_eq!(second.email.as_deref(), Some("ana.maria@example.com"));
        assert_eq!(second.picture.as_deref(), Some("https://img.example/ana.png"));
        assert_eq!(user_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_distinct_provider_ids_with_same_name() {
        let pool = pool().await;

        let a = upsert_from_provider(&pool, &profile("111", "Sam")).await.unwrap();
        let b = upsert_from_provider(&pool, &profile("222", "Sam")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(user_count(&pool).await, 2);
    }
}
