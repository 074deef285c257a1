use sqlx::{Pool, Sqlite};

use crate::crypto::{hash_password, verify_password};
use crate::db::{User, UserRepository};
use crate::error::{AppError, AuthFailure};

pub const MAX_USERNAME_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Validate and trim a username submitted on the registration form
pub fn validate_username(username: &str) -> Result<String, AppError> {
    let trimmed = username.trim();
    let len = trimmed.chars().count();

    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(AppError::validation(
            format!("Username must be 1-{} characters.", MAX_USERNAME_LEN),
            "/register",
        ));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(AppError::validation(
            "Username contains invalid characters.",
            "/register",
        ));
    }

    Ok(trimmed.to_string())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AppError::validation(
            format!(
                "Password must be {}-{} characters.",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            ),
            "/register",
        ));
    }
    Ok(())
}

/// Check a username/password pair against the stored Argon2 hash.
///
/// Only local accounts are considered. Accounts created through Google have
/// no password hash and can never be matched here.
pub async fn verify(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = UserRepository::get_local_by_username(pool, username.trim())
        .await?
        .ok_or(AuthFailure::UserNotFound)?;

    let stored_hash = user
        .password_hash
        .clone()
        .ok_or(AuthFailure::BadPassword)?;

    let password = password.to_owned();
    let valid =
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;

    if !valid {
        return Err(AuthFailure::BadPassword.into());
    }

    Ok(user)
}

/// Create a local account.
pub async fn register(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let username = validate_username(username)?;
    validate_password(password)?;

    if UserRepository::get_local_by_username(pool, &username).await?.is_some() {
        return Err(AppError::DuplicateUsername);
    }

    let password = password.to_owned();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    // The unique index still guards against a concurrent registration.
    UserRepository::create_local(pool, &username, &password_hash).await
}
