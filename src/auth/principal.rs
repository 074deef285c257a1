use sqlx::{Pool, Sqlite};
use tower_sessions::Session;

use crate::db::{User, UserRepository};
use crate::error::{AppError, SessionFailure};

/// Session key holding the signed-in user's id.
pub const USER_ID_KEY: &str = "user_id";

/// The value stored against a session: the user's id.
pub fn serialize(user: &User) -> i64 {
    user.id
}

/// Load the user a session refers to. A missing row means the session
/// outlived its user and is reported as [`SessionFailure::StaleSession`].
pub async fn deserialize(pool: &Pool<Sqlite>, user_id: i64) -> Result<User, AppError> {
    UserRepository::get_by_id(pool, user_id)
        .await?
        .ok_or_else(|| SessionFailure::StaleSession.into())
}

/// Bind `user` to the session. The id is cycled so a session fixed before
/// login cannot be reused.
pub async fn login(session: &Session, user: &User) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, serialize(user)).await?;

    tracing::info!("Session opened for user {}", user.id);
    Ok(())
}

/// Resolve the session to its principal.
///
/// Sessions without a user id are anonymous (`Ok(None)`). A session whose
/// user is gone is flushed and reported as an error.
pub async fn resolve(pool: &Pool<Sqlite>, session: &Session) -> Result<Option<User>, AppError> {
    let Some(user_id) = session.get::<i64>(USER_ID_KEY).await? else {
        return Ok(None);
    };

    match deserialize(pool, user_id).await {
        Ok(user) => Ok(Some(user)),
        Err(err) => {
            if matches!(err, AppError::Session(_)) {
                session.flush().await?;
            }
            Err(err)
        }
    }
}

pub async fn logout(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions_sqlx_store::SqliteStore;

    use crate::db::test_pool::pool;

    fn session(pool: &Pool<Sqlite>) -> Session {
        Session::new(None, Arc::new(SqliteStore::new(pool.clone())), None)
    }

    #[tokio::test]
    async fn test_login_then_resolve() {
        let pool = pool().await;
        let session = session(&pool);
        let user = UserRepository::create_local(&pool, "alice", "h").await.unwrap();

        assert!(resolve(&pool, &session).await.unwrap().is_none());

        login(&session, &user).await.unwrap();
        let resolved = resolve(&pool, &session).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);

        logout(&session).await.unwrap();
        assert!(resolve(&pool, &session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_session() {
        let pool = pool().await;
        let session = session(&pool);
        let user = UserRepository::create_local(&pool, "alice", "h").await.unwrap();
        login(&session, &user).await.unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = resolve(&pool, &session).await.unwrap_err();
        assert!(matches!(err, AppError::Session(SessionFailure::StaleSession)));
        // The orphaned session is emptied afterwards.
        assert!(session.is_empty().await);
        assert!(resolve(&pool, &session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deserialize_round_trips_id() {
        let pool = pool().await;
        let user = UserRepository::create_local(&pool, "alice", "h").await.unwrap();

        let loaded = deserialize(&pool, serialize(&user)).await.unwrap();
        assert_eq!(loaded.username, "alice");
    }
}
