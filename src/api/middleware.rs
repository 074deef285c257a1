use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::api::flash::{Flash, FLASH_KEY};
use crate::api::state::AppState;
use crate::auth::principal;
use crate::db::User;
use crate::error::AppError;

/// Session middleware - attaches the principal `User` to the request when
/// the session carries a user id
pub async fn resolve_session(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(user) = principal::resolve(&state.db, &session).await? {
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

/// Store a flash message attached to the response for the next page view
pub async fn persist_flash(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let response = next.run(request).await;

    let flash = response.extensions().get::<Flash>().cloned();
    if let Some(Flash(message)) = flash {
        session.insert(FLASH_KEY, message).await?;
    }

    Ok(response)
}

/// Guard for routes that need a signed-in user
pub async fn require_user(request: Request, next: Next) -> Response {
    if request.extensions().get::<User>().is_none() {
        return Redirect::to("/login").into_response();
    }

    next.run(request).await
}
