use std::sync::Arc;
use sqlx::{Pool, Sqlite};
use crate::auth::GoogleOAuth;
use crate::config::Config;

/// Everything a handler needs, built once in `main` and injected with `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Arc<Config>,
    /// `None` when Google sign-in is not configured.
    pub google: Option<Arc<GoogleOAuth>>,
}
