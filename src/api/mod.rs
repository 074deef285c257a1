pub mod auth;
pub mod flash;
pub mod google;
pub mod items;
pub mod middleware;
pub mod pages;
pub mod state;

pub use state::AppState;

use axum::{
    Form,
    Router,
    extract::rejection::FormRejection,
    http::StatusCode,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    trace::TraceLayer,
    timeout::TimeoutLayer,
};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use std::time::Duration;
use serde::Serialize;

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "todo_session";

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let session_layer = SessionManagerLayer::new(SqliteStore::new(state.db.clone()))
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_secure(state.config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(state.config.session_inactivity()))
        .with_signed(state.config.session_key.clone());

    // Anonymous callers are redirected to /login before reaching these
    let protected = Router::new()
        .route("/dashboard", get(items::dashboard))
        .route("/add", post(items::add))
        .route("/edit", post(items::edit))
        .route("/delete", post(items::delete))
        .route("/logout", post(auth::logout))
        .route_layer(axum_middleware::from_fn(middleware::require_user));

    Router::new()
        // Health check
        .route("/health", get(health))

        // Pages and local authentication
        .route("/", get(pages::landing))
        .route("/login", get(pages::login_form).post(auth::login))
        .route("/register", get(pages::register_form).post(auth::register))

        // Google sign-in
        .route("/auth/google", get(google::start))
        .route("/auth/google/secrets", get(google::callback))

        .merge(protected)

        // Resolve the session principal for every request
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_session,
        ))
        .layer(axum_middleware::from_fn(middleware::persist_flash))
        .layer(session_layer)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unwrap a submitted form. A body that does not deserialize is flashed on
/// `redirect_to` like any other invalid input.
pub(crate) fn accept_form<T>(
    form: Result<Form<T>, FormRejection>,
    redirect_to: &'static str,
) -> Result<T, AppError> {
    match form {
        Ok(Form(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected form body: {}", rejection);
            Err(AppError::validation(
                "The submitted form was incomplete or invalid.",
                redirect_to,
            ))
        }
    }
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
