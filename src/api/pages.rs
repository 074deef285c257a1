use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};
use tower_sessions::Session;

use crate::api::flash;
use crate::api::state::AppState;
use crate::db::User;
use crate::error::AppError;
use crate::views;

/// GET /
pub async fn landing(user: Option<Extension<User>>) -> Response {
    let user = user.map(|Extension(user)| user);
    views::landing(user.as_ref()).into_response()
}

/// GET /login
pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let flash = flash::take(&session).await?;
    Ok(views::login(flash.as_deref(), state.google.is_some()).into_response())
}

/// GET /register
pub async fn register_form(session: Session) -> Result<Response, AppError> {
    let flash = flash::take(&session).await?;
    Ok(views::register(flash.as_deref()).into_response())
}
