use sqlx::{Pool, Sqlite};
use crate::db::models::Item;
use crate::error::AppError;

/// Every statement here is scoped by `user_id`; an item is only ever
/// visible to, or changed by, its owner.
pub struct ItemRepository;

impl ItemRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: i64,
        title: &str,
    ) -> Result<Item, AppError> {
        let created_at = chrono::Utc::now().timestamp();

        let item = sqlx::query_as::<_, Item>(
            r#"
INSERT INTO items (title, user_id, created_at)
VALUES (?, ?, ?)
RETURNING *
            "#,
        )
        .bind(title)
        .bind(user_id)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(item)
    }

    /// All items owned by `user_id`, in insertion order.
    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: i64,
    ) -> Result<Vec<Item>, AppError> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE user_id = ? ORDER BY id ASC"
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    /// Returns the number of rows changed: 0 when the item does not exist or
    /// belongs to someone else.
    pub async fn update_title(
        pool: &Pool<Sqlite>,
        id: i64,
        user_id: i64,
        title: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE items SET title = ? WHERE id = ? AND user_id = ?")
            .bind(title)
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Same contract as [`ItemRepository::update_title`].
    pub async fn delete(
        pool: &Pool<Sqlite>,
        id: i64,
        user_id: i64,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
