use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_auth::{
    api::{create_router, AppState},
    auth::GoogleOAuth,
    config::Config,
    db::{migrate, OAuthStateRepository},
    error::AppError,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,todo_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting to-do server v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded");

    // Setup database with proper connection pooling
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true);

    let db = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await?;

    tracing::info!("✅ Database connected: {}", config.database_url);

    // Run migrations
    migrate(&db).await?;

    tracing::info!("✅ Database migrations completed");

    let google = match &config.google {
        Some(google_config) => {
            tracing::info!("✅ Google sign-in enabled ({})", google_config.callback_url);
            Some(Arc::new(GoogleOAuth::new(google_config)?))
        }
        None => {
            tracing::warn!("⚠️ GOOGLE_CLIENT_ID not set, Google sign-in disabled");
            None
        }
    };

    // Create shared application state
    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        google,
    };

    // Spawn background task for session and OAuth state cleanup
    {
        let db_clone = db.clone();
        let session_store = SqliteStore::new(db.clone());
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600)); // Every hour
            loop {
                interval.tick().await;
                match session_store.delete_expired().await {
                    Ok(()) => tracing::debug!("🧹 Removed expired sessions"),
                    Err(e) => tracing::error!("❌ Session cleanup failed: {}", e),
                }
                if let Err(e) = OAuthStateRepository::cleanup_expired(&db_clone).await {
                    tracing::error!("❌ OAuth state cleanup failed: {}", e);
                }
            }
        });
        tracing::info!("✅ Session cleanup task started (runs hourly)");
    }

    // Build router
    let app = create_router(state);

    // Bind and serve
    let addr = config.server_address();
    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("🏥 Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
