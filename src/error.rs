use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use thiserror::Error;

use crate::api::flash::Flash;
use crate::views;

/// Why a username/password pair was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("user not found")]
    UserNotFound,

    #[error("bad password")]
    BadPassword,
}

/// A session token that no longer maps to a usable principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionFailure {
    #[error("session refers to a user that no longer exists")]
    StaleSession,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthFailure),

    #[error("Session error: {0}")]
    Session(#[from] SessionFailure),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    SessionStore(#[from] tower_sessions::session::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        redirect_to: &'static str,
    },

    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Item not found")]
    NotFoundOrForbidden,

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>, redirect_to: &'static str) -> Self {
        AppError::Validation {
            message: message.into(),
            redirect_to,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

fn redirect_with_flash(to: &str, message: &str) -> Response {
    (Extension(Flash(message.to_string())), Redirect::to(to)).into_response()
}

fn error_page(status: StatusCode, message: &str) -> Response {
    (status, views::error_page(status, message)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Auth(failure) => {
                tracing::info!("Login rejected: {}", failure);
                redirect_with_flash("/login", "Invalid username or password.")
            }
            AppError::Validation {
                message,
                redirect_to,
            } => redirect_with_flash(redirect_to, &message),
            AppError::DuplicateUsername => {
                redirect_with_flash("/register", "That username is already taken.")
            }
            AppError::OAuth(msg) => {
                tracing::warn!("Google sign-in failed: {}", msg);
                redirect_with_flash("/login", "Google sign-in failed. Please try again.")
            }
            AppError::NotFoundOrForbidden => {
                error_page(StatusCode::NOT_FOUND, "That item does not exist.")
            }
            AppError::Session(failure) => {
                tracing::error!("Session error: {}", failure);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Your session is no longer valid. Please log in again.",
                )
            }
            err => {
                tracing::error!("Request failed: {}", err);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again later.",
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn flash_of(response: &Response) -> Option<&str> {
        response.extensions().get::<Flash>().map(|f| f.0.as_str())
    }

    #[test]
    fn test_auth_failure_redirects_to_login() {
        let response = AppError::Auth(AuthFailure::BadPassword).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert_eq!(flash_of(&response), Some("Invalid username or password."));
    }

    #[test]
    fn test_validation_redirects_to_form() {
        let response = AppError::validation("Title is required.", "/dashboard").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/dashboard");
        assert_eq!(flash_of(&response), Some("Title is required."));
    }

    #[test]
    fn test_backend_error_is_generic_500() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.headers().contains_key(header::LOCATION));
        assert!(flash_of(&response).is_none());
    }

    #[test]
    fn test_stale_session_is_500_without_redirect() {
        let response = AppError::Session(SessionFailure::StaleSession).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.headers().contains_key(header::LOCATION));
    }

    #[test]
    fn test_not_found_or_forbidden_is_404() {
        let response = AppError::NotFoundOrForbidden.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
