//! Async host facade
//!
//! Each function takes the shared `AppState`, loads what it needs from the
//! store, runs the pure engines and persists any state change. Callers must
//! serialize calls that mutate periodization state.

pub mod periodization;
pub mod progression;
pub mod volume;

use serde::Serialize;

use crate::db::AppState;
use crate::models::{ExerciseSession, ExerciseType};
use crate::periodization::PeriodizationError;
use crate::series::{MostRecentFirst, Ordered};
use crate::store::{self, StoreError};

/// Sessions loaded per exercise for history-based calculations
pub const HISTORY_LIMIT: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Periodization(#[from] PeriodizationError),
}

impl Serialize for CommandError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// Log a session for an exercise
pub async fn record_session(
  state: &AppState,
  exercise: &str,
  exercise_type: ExerciseType,
  session: &ExerciseSession,
) -> Result<i64, CommandError> {
  Ok(store::save_session(&state.db, exercise, exercise_type, session).await?)
}

/// Recent sessions of an exercise, newest first
pub async fn get_history(
  state: &AppState,
  exercise: &str,
) -> Result<Ordered<ExerciseSession, MostRecentFirst>, CommandError> {
  Ok(store::load_history(&state.db, exercise, HISTORY_LIMIT).await?)
}
