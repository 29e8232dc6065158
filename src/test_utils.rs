//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Session and history factories
//! - Helper assertions

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::config::CoachConfig;
use crate::db::AppState;
use crate::models::{ExerciseSession, ExerciseType, Set};
use crate::series::{Chronological, Ordered};
use crate::store;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// App state over a fresh in-memory database with default config
pub async fn setup_test_state() -> AppState {
  AppState {
    db: setup_test_db().await,
    config: CoachConfig::default(),
  }
}

/// Seed one session per week for `exercise`, oldest first, ending one week
/// before now. Each session has a single set of 8 reps at the given weight.
/// Returns the session IDs.
pub async fn seed_sessions(pool: &SqlitePool, exercise: &str, weights: &[f64]) -> Vec<i64> {
  let mut ids = Vec::new();
  let now = Utc::now();
  let n = weights.len() as i64;

  for (i, weight) in weights.iter().enumerate() {
    let session = ExerciseSession::new(
      now - Duration::weeks(n - i as i64),
      vec![Set::new(*weight, 8)],
    );
    let id = store::save_session(pool, exercise, ExerciseType::Compound, &session)
      .await
      .expect("Failed to seed session");
    ids.push(id);
  }

  ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Weekly sessions ending one week before `now`, one set per session
pub fn mock_weekly_history(
  weights: &[f64],
  reps: u32,
  now: DateTime<Utc>,
) -> Ordered<ExerciseSession, Chronological> {
  let n = weights.len() as i64;
  Ordered::new(
    weights
      .iter()
      .enumerate()
      .map(|(i, w)| ExerciseSession::new(now - Duration::weeks(n - i as i64), vec![Set::new(*w, reps)]))
      .collect(),
  )
}

/// A fixed Monday morning, for tests that need whole-second timestamps
pub fn fixed_monday() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0)
    .single()
    .expect("valid fixed date")
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    // Verify key tables exist
    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('exercise_sessions', 'exercise_sets', 'periodization_state', 'phase_history', 'phase_transitions')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_sessions_returns_correct_count() {
    let pool = setup_test_db().await;

    let ids = seed_sessions(&pool, "squat", &[100.0, 105.0, 110.0]).await;
    assert_eq!(ids.len(), 3);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercise_sets")
      .fetch_one(&pool)
      .await
      .expect("Failed to count sets");

    assert_eq!(count, 3);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_weekly_history_is_chronological() {
    let now = Utc::now();
    let history = mock_weekly_history(&[60.0, 62.5], 10, now);
    assert_eq!(history.len(), 2);
    let first = history.first().unwrap();
    assert_eq!(first.sets[0].weight, 60.0);
    assert_eq!(first.date, now - Duration::weeks(2));
  }
}
