//! Training recommendation engine for a strength-training log.
//!
//! The calculators (`progression`, `plateau`, `periodization`, `volume`,
//! `forecast`, `risk`) are pure and synchronous. `store` persists history and
//! periodization state in SQLite, and `commands` is the async facade a UI or
//! API host binds to.

pub mod coach;
pub mod commands;
pub mod config;
pub mod db;
pub mod forecast;
pub mod models;
pub mod periodization;
pub mod plateau;
pub mod progression;
pub mod research;
pub mod risk;
pub mod series;
pub mod store;
pub mod trend;
pub mod volume;

#[cfg(test)]
pub mod test_utils;

pub use coach::{Coach, RecommendationBundle, RecommendationRequest};
pub use config::{CoachConfig, ConfigError, TransitionConfig};
pub use db::{initialize_db, AppState, DbPool};
pub use periodization::{PeriodizationState, PhaseEngine, TransitionDecision};
pub use research::Analysis;
pub use series::{Chronological, MostRecentFirst, Ordered};
pub use store::StoreError;

/// Load `.env`, read configuration and open the database
pub async fn bootstrap() -> Result<AppState, StoreError> {
  config::load_env();
  let config = match CoachConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      tracing::warn!(error = %e, "invalid configuration, using defaults");
      CoachConfig::default()
    }
  };
  AppState::connect(config).await
}
