use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::state::AppState;
use crate::api::{accept_form, flash};
use crate::db::{ItemRepository, User};
use crate::error::AppError;
use crate::views;

pub const MAX_TITLE_LEN: usize = 500;

#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    #[serde(rename = "newItem")]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct EditItemForm {
    #[serde(rename = "updatedItemId")]
    pub id: i64,
    #[serde(rename = "updatedItemTitle")]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteItemForm {
    #[serde(rename = "deleteItemId")]
    pub id: i64,
}

/// Trim a submitted title and reject empty or oversized ones.
fn validate_title(title: &str) -> Result<&str, AppError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(AppError::validation("Item title cannot be empty.", "/dashboard"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(
            format!("Item title must be at most {} characters.", MAX_TITLE_LEN),
            "/dashboard",
        ));
    }

    Ok(trimmed)
}

fn to_dashboard() -> Response {
    Redirect::to("/dashboard").into_response()
}

/// GET /dashboard (requires auth)
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    session: Session,
) -> Result<Response, AppError> {
    let items = ItemRepository::list_for_user(&state.db, user.id).await?;
    let flash = flash::take(&session).await?;

    Ok(views::dashboard(&user, &items, flash.as_deref()).into_response())
}

/// POST /add (requires auth)
pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    form: Result<Form<AddItemForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = accept_form(form, "/dashboard")?;
    let title = validate_title(&form.title)?;
    let item = ItemRepository::create(&state.db, user.id, title).await?;
    tracing::debug!("User {} added item {}", user.id, item.id);

    Ok(to_dashboard())
}

/// POST /edit (requires auth)
pub async fn edit(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    form: Result<Form<EditItemForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = accept_form(form, "/dashboard")?;
    let title = validate_title(&form.title)?;

    if ItemRepository::update_title(&state.db, form.id, user.id, title).await? == 0 {
        tracing::info!("User {} tried to edit item {} they do not own", user.id, form.id);
        return Err(AppError::NotFoundOrForbidden);
    }

    Ok(to_dashboard())
}

/// POST /delete (requires auth)
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    form: Result<Form<DeleteItemForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = accept_form(form, "/dashboard")?;
    if ItemRepository::delete(&state.db, form.id, user.id).await? == 0 {
        tracing::info!("User {} tried to delete item {} they do not own", user.id, form.id);
        return Err(AppError::NotFoundOrForbidden);
    }

    Ok(to_dashboard())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Buy milk ").unwrap(), "Buy milk");
        assert!(matches!(validate_title(" \t "), Err(AppError::Validation { .. })));
        assert!(validate_title(&"a".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(validate_title(&"a".repeat(MAX_TITLE_LEN + 1)).is_err());
    }
}
