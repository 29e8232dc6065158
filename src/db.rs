use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::CoachConfig;
use crate::store::StoreError;

pub type DbPool = SqlitePool;

/// Application state handed to every command: pool plus engine configuration
pub struct AppState {
  pub db: DbPool,
  pub config: CoachConfig,
}

impl AppState {
  /// Open the configured database and wrap it with `config`
  pub async fn connect(config: CoachConfig) -> Result<Self, StoreError> {
    let db = initialize_db(&config.database_url).await?;
    Ok(Self { db, config })
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, StoreError> {
  info!(url = database_url, "initializing database");

  // Create connection pool
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(database_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("database initialized");

  Ok(pool)
}
