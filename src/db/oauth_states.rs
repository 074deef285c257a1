use sqlx::{Pool, Sqlite};
use crate::error::AppError;

/// How long a started Google sign-in stays redeemable.
pub const OAUTH_STATE_TTL_SECS: i64 = 600;

/// CSRF state and PKCE verifier for in-flight Google sign-ins.
pub struct OAuthStateRepository;

impl OAuthStateRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        state: &str,
        pkce_verifier: &str,
    ) -> Result<(), AppError> {
        let expires_at = chrono::Utc::now().timestamp() + OAUTH_STATE_TTL_SECS;

        sqlx::query("INSERT INTO oauth_states (state, pkce_verifier, expires_at) VALUES (?, ?, ?)")
            .bind(state)
            .bind(pkce_verifier)
            .bind(expires_at)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Remove the state and return its PKCE verifier if it was still valid.
    /// A state can be consumed at most once.
    pub async fn consume(
        pool: &Pool<Sqlite>,
        state: &str,
    ) -> Result<Option<String>, AppError> {
        let now = chrono::Utc::now().timestamp();

        let verifier: Option<String> = sqlx::query_scalar(
            r#"
DELETE FROM oauth_states
WHERE state = ? AND expires_at > ?
RETURNING pkce_verifier
            "#,
        )
        .bind(state)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        Ok(verifier)
    }

    pub async fn cleanup_expired(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at <= ?")
            .bind(now)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
