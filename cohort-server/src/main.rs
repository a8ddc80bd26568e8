use anyhow::Context;
use cohort_server::{app, config::Settings, db::Database, rate_limit::RateLimiter, state::AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are purged
const SESSION_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cohort_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    let db = Database::new(&settings.database.path)?;
    db.initialize()?;
    if settings.database.seed {
        db.seed_test_data()?;
        tracing::info!("Test data seeded successfully");
    }
    tracing::info!("Database initialized at {}", settings.database.path);

    let state = AppState::from_settings(db, &settings)?;

    match state.session_manager.cleanup_expired_sessions() {
        Ok(0) => tracing::info!("No expired sessions to clean up"),
        Ok(count) => tracing::info!("Cleaned up {} expired sessions on startup", count),
        Err(e) => tracing::error!("Failed to cleanup expired sessions on startup: {}", e),
    }

    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS));
        // The first tick completes immediately and startup already cleaned up
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic session cleanup...");
            match cleanup_state.session_manager.cleanup_expired_sessions() {
                Ok(count) if count > 0 => {
                    tracing::info!("Periodic cleanup: removed {} expired sessions", count)
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Periodic session cleanup failed: {}", e),
            }
        }
    });

    let rate_limiter = RateLimiter::new(settings.rate_limit.max_requests, settings.rate_limit.window_seconds);
    let app = app::router(state, rate_limiter);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Failed to parse server address")?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
