pub mod items;
pub mod models;
pub mod oauth_states;
pub mod users;

pub use items::ItemRepository;
pub use models::{Item, User};
pub use oauth_states::OAuthStateRepository;
pub use users::{NewFederatedUser, UserRepository};

use sqlx::{Pool, Sqlite};
use tower_sessions_sqlx_store::SqliteStore;

use crate::error::AppError;

/// Apply the application schema and the session store's table.
pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

    SqliteStore::new(pool.clone()).migrate().await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_pool {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};

    /// Fresh in-memory database with the schema applied. One connection, since
    /// every SQLite `:memory:` connection is its own database.
    pub async fn pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        super::migrate(&pool).await.unwrap();
        pool
    }
}
