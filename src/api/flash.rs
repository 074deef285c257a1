use tower_sessions::Session;

use crate::error::AppError;

pub const FLASH_KEY: &str = "flash";

/// One-time notice attached to a response. `persist_flash` moves it into the
/// session so the next rendered page can show it.
#[derive(Clone, Debug)]
pub struct Flash(pub String);

/// Remove and return the pending flash message, if any.
pub async fn take(session: &Session) -> Result<Option<String>, AppError> {
    Ok(session.remove::<String>(FLASH_KEY).await?)
}
