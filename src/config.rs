use std::str::FromStr;

use tower_sessions::cookie::Key;

use crate::error::AppError;

/// Google OAuth client registration. Present only when both the client id
/// and secret are configured.
#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
    pub session_expiry_hours: i64,
    /// Signs the session cookie. Derived from `SESSION_SECRET`.
    pub session_key: Key,
    pub cookie_secure: bool,
    pub google: Option<GoogleConfig>,
}

const MIN_SECRET_LEN: usize = 64;

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret = var("SESSION_SECRET")
            .ok_or_else(|| AppError::Config("SESSION_SECRET not set".to_string()))?;
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "SESSION_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        let session_key = Key::try_from(session_secret.as_bytes())
            .map_err(|e| AppError::Config(format!("Invalid SESSION_SECRET: {}", e)))?;

        let session_expiry_hours: i64 = parse_or(&var, "SESSION_EXPIRY_HOURS", 24)?;
        if session_expiry_hours <= 0 {
            return Err(AppError::Config(
                "SESSION_EXPIRY_HOURS must be positive".to_string(),
            ));
        }

        let google = match (var("GOOGLE_CLIENT_ID"), var("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                callback_url: var("GOOGLE_CALLBACK_URL").unwrap_or_else(|| {
                    "http://localhost:3000/auth/google/secrets".to_string()
                }),
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set together".to_string(),
                ))
            }
        };

        Ok(Config {
            server_host: var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&var, "SERVER_PORT", 3000)?,
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://todo.db".to_string()),
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 10)?,
            db_min_connections: parse_or(&var, "DB_MIN_CONNECTIONS", 1)?,
            request_timeout_secs: parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?,
            session_expiry_hours,
            session_key,
            cookie_secure: parse_or(&var, "COOKIE_SECURE", false)?,
            google,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn session_inactivity(&self) -> time::Duration {
        time::Duration::hours(self.session_expiry_hours)
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SESSION_SECRET", SECRET)]).unwrap();
        assert_eq!(config.server_address(), "127.0.0.1:3000");
        assert_eq!(config.database_url, "sqlite://todo.db");
        assert_eq!(config.session_inactivity(), time::Duration::hours(24));
        assert!(!config.cookie_secure);
        assert!(config.google.is_none());
    }

    #[test]
    fn test_secret_is_required() {
        assert!(matches!(load(&[]), Err(AppError::Config(_))));
        assert!(matches!(
            load(&[("SESSION_SECRET", "short")]),
            Err(AppError::Config(_))
        ));
        // Signing keys need 64 bytes.
        assert!(matches!(
            load(&[("SESSION_SECRET", &SECRET[..32])]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_port() {
        let result = load(&[("SESSION_SECRET", SECRET), ("SERVER_PORT", "http")]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_google_requires_both_credentials() {
        let result = load(&[("SESSION_SECRET", SECRET), ("GOOGLE_CLIENT_ID", "id")]);
        assert!(matches!(result, Err(AppError::Config(_))));

        let config = load(&[
            ("SESSION_SECRET", SECRET),
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("GOOGLE_CALLBACK_URL", "https://todo.example/auth/google/secrets"),
        ])
        .unwrap();
        let google = config.google.unwrap();
        assert_eq!(google.client_id, "id");
        assert_eq!(google.callback_url, "https://todo.example/auth/google/secrets");
    }
}
