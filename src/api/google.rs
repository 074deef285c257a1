use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::auth::sign_in;
use crate::api::state::AppState;
use crate::auth::upsert_from_provider;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn not_configured() -> AppError {
    AppError::validation("Google sign-in is not available.", "/login")
}

/// GET /auth/google
pub async fn start(State(state): State<AppState>) -> Result<Response, AppError> {
    let google = state.google.as_ref().ok_or_else(not_configured)?;
    let url = google.authorize_url(&state.db).await?;

    Ok(Redirect::to(&url).into_response())
}

/// GET /auth/google/secrets
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let google = state.google.as_ref().ok_or_else(not_configured)?;

    if let Some(error) = query.error {
        return Err(AppError::OAuth(format!("Provider returned error: {}", error)));
    }
    let (Some(code), Some(csrf_state)) = (query.code, query.state) else {
        return Err(AppError::OAuth("Callback is missing code or state".to_string()));
    };

    let profile = google.exchange_code(&state.db, &code, &csrf_state).await?;
    let user = upsert_from_provider(&state.db, &profile).await?;
    tracing::info!("User {} signed in with Google", user.id);

    sign_in(&session, &user).await
}
