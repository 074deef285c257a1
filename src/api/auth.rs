use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::accept_form;
use crate::api::state::AppState;
use crate::auth::{self as authn, principal};
use crate::db::User;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

/// Bind `user` to the session and send them to their dashboard.
pub(crate) async fn sign_in(session: &Session, user: &User) -> Result<Response, AppError> {
    principal::login(session, user).await?;

    Ok(Redirect::to("/dashboard").into_response())
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = accept_form(form, "/register")?;
    let user = authn::register(&state.db, &form.username, &form.password).await?;
    tracing::info!("Registered user {} ({})", user.id, user.username);

    sign_in(&session, &user).await
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = accept_form(form, "/login")?;
    let user = authn::verify(&state.db, &form.username, &form.password).await?;
    tracing::info!("User {} logged in", user.id);

    sign_in(&session, &user).await
}

/// POST /logout (requires auth)
pub async fn logout(
    session: Session,
    Extension(user): Extension<User>,
) -> Result<Response, AppError> {
    principal::logout(&session).await?;
    tracing::info!("User {} logged out", user.id);

    Ok(Redirect::to("/").into_response())
}
