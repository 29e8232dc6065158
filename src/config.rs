//! Engine configuration
//!
//! Defaults carry the evidence-anchored constants; any `LIFT_LOG_*`
//! environment variable (or `.env` entry) overrides its field.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value:?}")]
  Invalid { key: String, value: String },
}

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const ENV_DATABASE_URL: &str = "LIFT_LOG_DATABASE_URL";
pub const ENV_HYPERTROPHY_MIN_WEEKS: &str = "LIFT_LOG_HYPERTROPHY_MIN_WEEKS";
pub const ENV_STRENGTH_MIN_WEEKS: &str = "LIFT_LOG_STRENGTH_MIN_WEEKS";
pub const ENV_DELOAD_MIN_WEEKS: &str = "LIFT_LOG_DELOAD_MIN_WEEKS";
pub const ENV_PLATEAU_RISK_THRESHOLD: &str = "LIFT_LOG_PLATEAU_RISK_THRESHOLD";
pub const ENV_PLATEAU_SLOPE_CEILING: &str = "LIFT_LOG_PLATEAU_SLOPE_CEILING";
pub const ENV_STAGNATION_THRESHOLD: &str = "LIFT_LOG_STAGNATION_THRESHOLD";
pub const ENV_MIN_DATA_POINTS: &str = "LIFT_LOG_MIN_DATA_POINTS";
pub const ENV_PLATEAU_WINDOW: &str = "LIFT_LOG_PLATEAU_WINDOW";
pub const ENV_FORECAST_HORIZON_WEEKS: &str = "LIFT_LOG_FORECAST_HORIZON_WEEKS";
pub const ENV_AUTO_TRANSITIONS: &str = "LIFT_LOG_AUTO_TRANSITIONS";

/// Phase transition tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
  pub hypertrophy_min_weeks: i64,
  pub strength_min_weeks: i64,
  pub deload_min_weeks: i64,
  /// Plateau risk above this can end hypertrophy early
  pub plateau_risk_threshold: f64,
  /// ...but only while the progression slope is at or below this
  pub plateau_slope_ceiling: f64,
  /// Strength ends early once the progression slope falls below this
  pub stagnation_threshold: f64,
  /// Performance points needed before slope-based triggers are trusted
  pub min_data_points: usize,
}

impl Default for TransitionConfig {
  fn default() -> Self {
    Self {
      hypertrophy_min_weeks: 6,
      strength_min_weeks: 4,
      deload_min_weeks: 1,
      plateau_risk_threshold: 0.7,
      plateau_slope_ceiling: 0.01,
      stagnation_threshold: 0.01,
      min_data_points: 4,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachConfig {
  pub database_url: String,
  pub transitions: TransitionConfig,
  pub plateau_window: usize,
  pub forecast_horizon_weeks: f64,
  pub auto_transitions: bool,
}

impl Default for CoachConfig {
  fn default() -> Self {
    Self {
      database_url: "sqlite://lift-log.db?mode=rwc".to_string(),
      transitions: TransitionConfig::default(),
      plateau_window: crate::plateau::DEFAULT_WINDOW,
      forecast_horizon_weeks: crate::forecast::DEFAULT_HORIZON_WEEKS,
      auto_transitions: true,
    }
  }
}

impl CoachConfig {
  /// Defaults overlaid with any `LIFT_LOG_*` variables present
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Ok(url) = env::var(ENV_DATABASE_URL) {
      config.database_url = url;
    }

    let t = &mut config.transitions;
    override_from_env(ENV_HYPERTROPHY_MIN_WEEKS, &mut t.hypertrophy_min_weeks)?;
    override_from_env(ENV_STRENGTH_MIN_WEEKS, &mut t.strength_min_weeks)?;
    override_from_env(ENV_DELOAD_MIN_WEEKS, &mut t.deload_min_weeks)?;
    override_from_env(ENV_PLATEAU_RISK_THRESHOLD, &mut t.plateau_risk_threshold)?;
    override_from_env(ENV_PLATEAU_SLOPE_CEILING, &mut t.plateau_slope_ceiling)?;
    override_from_env(ENV_STAGNATION_THRESHOLD, &mut t.stagnation_threshold)?;
    override_from_env(ENV_MIN_DATA_POINTS, &mut t.min_data_points)?;
    override_from_env(ENV_PLATEAU_WINDOW, &mut config.plateau_window)?;
    override_from_env(ENV_FORECAST_HORIZON_WEEKS, &mut config.forecast_horizon_weeks)?;
    override_from_env(ENV_AUTO_TRANSITIONS, &mut config.auto_transitions)?;

    Ok(config)
  }
}

fn override_from_env<T: FromStr>(key: &str, target: &mut T) -> Result<(), ConfigError> {
  match env::var(key) {
    Ok(raw) => {
      *target = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: raw.clone(),
      })?;
      Ok(())
    }
    Err(_) => Ok(()),
  }
}

/// Load variables from a `.env` file if one exists
pub fn load_env() {
  if dotenvy::dotenv().is_ok() {
    tracing::debug!("loaded .env");
  }
}
