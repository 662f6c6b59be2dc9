/**
 * Server Configuration
 *
 * Environment-driven configuration with graceful degradation: a missing
 * or unreachable database downgrades the server to the in-memory store
 * instead of aborting startup, which is enough for local development.
 */

use sqlx::PgPool;

/// Database configuration result
///
/// `None` means no database is available and the caller should fall back
/// to the in-memory store.
pub type DatabaseConfig = Option<PgPool>;

/// Load the PostgreSQL pool from `DATABASE_URL` and run migrations
pub async fn load_database() -> DatabaseConfig {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set. Falling back to in-memory message store.");
        return None;
    };

    tracing::info!("Connecting to database...");
    match connect_and_migrate(&database_url).await {
        Ok(pool) => {
            tracing::info!("Database ready");
            Some(pool)
        }
        Err(e) => {
            tracing::error!("Failed to connect to database: {:?}", e);
            tracing::warn!("Falling back to in-memory message store.");
            None
        }
    }
}

async fn connect_and_migrate(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;
    if let Err(e) = sqlx::migrate!().run(&pool).await {
        // Might have already been applied by a previous deploy.
        tracing::error!("Failed to run database migrations: {}", e);
        tracing::warn!("Continuing without migrations - database might not be up to date");
    }
    Ok(pool)
}

/// Resolve the TCP port the server binds to
pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3030)
}
