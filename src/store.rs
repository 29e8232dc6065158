//! SQLite persistence for workout history and periodization state
//!
//! Timestamps are stored as RFC3339 strings with millisecond precision.
//! Phases are stored as JSON blobs in their serialized (camelCase) form.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::models::phase::MAX_PHASE_WEEKS;
use crate::models::{ExerciseSession, ExerciseType, PeriodizationPhase, PhaseCustomization, PhaseType, Set};
use crate::periodization::{PeriodizationState, TransitionDecision, TransitionTrigger};
use crate::series::{MostRecentFirst, Ordered};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Corrupt row: {0}")]
  Corrupt(String),
}

impl Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

pub const MAX_RPE: f64 = 10.0;

fn to_db_time(ts: DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn from_db_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StoreError::Corrupt(format!("timestamp {:?}: {}", raw, e)))
}

/// Reject values the calculators would silently propagate
pub fn validate_session(exercise: &str, session: &ExerciseSession) -> Result<(), StoreError> {
  if exercise.trim().is_empty() {
    return Err(StoreError::InvalidInput("exercise name is empty".to_string()));
  }

  for (i, set) in session.sets.iter().enumerate() {
    if !set.weight.is_finite() || set.weight < 0.0 {
      return Err(StoreError::InvalidInput(format!(
        "set {}: weight must be a non-negative number, got {}",
        i + 1,
        set.weight
      )));
    }
    if let Some(rpe) = set.rpe {
      if !(0.0..=MAX_RPE).contains(&rpe) {
        return Err(StoreError::InvalidInput(format!(
          "set {}: RPE must be between 0 and {}, got {}",
          i + 1,
          MAX_RPE,
          rpe
        )));
      }
    }
  }

  Ok(())
}

/// Phase overrides must describe a block the calendar can hold
pub fn validate_customization(customization: &PhaseCustomization) -> Result<(), StoreError> {
  if let Some(weeks) = customization.total_weeks {
    if weeks > MAX_PHASE_WEEKS {
      return Err(StoreError::InvalidInput(format!(
        "total weeks must be at most {}, got {}",
        MAX_PHASE_WEEKS, weeks
      )));
    }
  }
  if let Some(multiplier) = customization.volume_multiplier {
    if !multiplier.is_finite() || multiplier <= 0.0 {
      return Err(StoreError::InvalidInput(format!(
        "volume multiplier must be a positive number, got {}",
        multiplier
      )));
    }
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Workout History
/// ---------------------------------------------------------------------------

/// Insert a session and its sets in one transaction, returning the session id
pub async fn save_session(
  pool: &SqlitePool,
  exercise: &str,
  exercise_type: ExerciseType,
  session: &ExerciseSession,
) -> Result<i64, StoreError> {
  validate_session(exercise, session)?;

  let mut tx = pool.begin().await?;

  let result = sqlx::query(
    r#"
    INSERT INTO exercise_sessions (exercise, exercise_type, performed_at)
    VALUES (?, ?, ?)
    "#,
  )
  .bind(exercise)
  .bind(exercise_type.to_string())
  .bind(to_db_time(session.date))
  .execute(&mut *tx)
  .await?;
  let session_id = result.last_insert_rowid();

  for (position, set) in session.sets.iter().enumerate() {
    sqlx::query(
      r#"
      INSERT INTO exercise_sets (session_id, position, weight, reps, rpe)
      VALUES (?, ?, ?, ?, ?)
      "#,
    )
    .bind(session_id)
    .bind(position as i64)
    .bind(set.weight)
    .bind(set.reps as i64)
    .bind(set.rpe)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;

  debug!(exercise, session_id, sets = session.sets.len(), "session saved");
  Ok(session_id)
}

/// The `limit` most recent sessions of an exercise, newest first.
///
/// Sessions logged without sets are returned with an empty set list.
pub async fn load_history(
  pool: &SqlitePool,
  exercise: &str,
  limit: u32,
) -> Result<Ordered<ExerciseSession, MostRecentFirst>, StoreError> {
  let rows = sqlx::query(
    r#"
    SELECT s.id AS session_id, s.performed_at, st.weight, st.reps, st.rpe
    FROM (
      SELECT id, performed_at
      FROM exercise_sessions
      WHERE exercise = ?
      ORDER BY performed_at DESC, id DESC
      LIMIT ?
    ) s
    LEFT JOIN exercise_sets st ON st.session_id = s.id
    ORDER BY s.performed_at DESC, s.id DESC, st.position ASC
    "#,
  )
  .bind(exercise)
  .bind(limit as i64)
  .fetch_all(pool)
  .await?;

  let mut sessions: Vec<ExerciseSession> = Vec::new();
  let mut current_id: Option<i64> = None;

  for row in rows {
    let session_id: i64 = row.get("session_id");
    if current_id != Some(session_id) {
      let performed_at: String = row.get("performed_at");
      sessions.push(ExerciseSession::new(from_db_time(&performed_at)?, Vec::new()));
      current_id = Some(session_id);
    }

    let weight: Option<f64> = row.get("weight");
    let reps: Option<i64> = row.get("reps");
    if let (Some(weight), Some(reps), Some(session)) = (weight, reps, sessions.last_mut()) {
      let reps = u32::try_from(reps)
        .map_err(|_| StoreError::Corrupt(format!("session {}: reps {}", session_id, reps)))?;
      session.sets.push(Set {
        weight,
        reps,
        rpe: row.get("rpe"),
      });
    }
  }

  Ok(Ordered::new(sessions))
}

/// ---------------------------------------------------------------------------
/// Periodization State
/// ---------------------------------------------------------------------------

pub async fn load_periodization_state(
  pool: &SqlitePool,
) -> Result<Option<PeriodizationState>, StoreError> {
  let row = sqlx::query(
    r#"
    SELECT current_phase_json, next_transition, auto_transitions, customizations_json
    FROM periodization_state
    WHERE id = 1
    "#,
  )
  .fetch_optional(pool)
  .await?;

  let row = match row {
    Some(row) => row,
    None => return Ok(None),
  };

  let current_phase_json: String = row.get("current_phase_json");
  let next_transition: String = row.get("next_transition");
  let customizations_json: String = row.get("customizations_json");

  let current_phase: PeriodizationPhase = serde_json::from_str(&current_phase_json)?;
  let customizations: BTreeMap<PhaseType, PhaseCustomization> =
    serde_json::from_str(&customizations_json)?;

  let history_rows = sqlx::query("SELECT phase_json FROM phase_history ORDER BY id ASC")
    .fetch_all(pool)
    .await?;
  let mut phase_history = Vec::with_capacity(history_rows.len());
  for row in history_rows {
    let phase_json: String = row.get("phase_json");
    phase_history.push(serde_json::from_str::<PeriodizationPhase>(&phase_json)?);
  }

  Ok(Some(PeriodizationState {
    current_phase,
    phase_history,
    next_transition: from_db_time(&next_transition)?,
    auto_transitions: row.get::<bool, _>("auto_transitions"),
    customizations,
  }))
}

/// Upsert the state. Phase history is append-only: archived phases already
/// stored are left untouched.
pub async fn save_periodization_state(
  pool: &SqlitePool,
  state: &PeriodizationState,
) -> Result<(), StoreError> {
  let mut tx = pool.begin().await?;
  write_state(&mut tx, state).await?;
  tx.commit().await?;
  Ok(())
}

async fn write_state(conn: &mut SqliteConnection, state: &PeriodizationState) -> Result<(), StoreError> {
  let current_phase_json = serde_json::to_string(&state.current_phase)?;
  let customizations_json = serde_json::to_string(&state.customizations)?;

  sqlx::query(
    r#"
    INSERT INTO periodization_state
      (id, current_phase_json, next_transition, auto_transitions, customizations_json, updated_at)
    VALUES (1, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
      current_phase_json = excluded.current_phase_json,
      next_transition = excluded.next_transition,
      auto_transitions = excluded.auto_transitions,
      customizations_json = excluded.customizations_json,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(&current_phase_json)
  .bind(to_db_time(state.next_transition))
  .bind(state.auto_transitions)
  .bind(&customizations_json)
  .bind(to_db_time(Utc::now()))
  .execute(&mut *conn)
  .await?;

  for phase in &state.phase_history {
    sqlx::query(
      r#"
      INSERT OR IGNORE INTO phase_history (phase_id, phase_type, phase_json)
      VALUES (?, ?, ?)
      "#,
    )
    .bind(phase.id.to_string())
    .bind(phase.phase_type.to_string())
    .bind(serde_json::to_string(phase)?)
    .execute(&mut *conn)
    .await?;
  }

  debug!(
    phase = %state.current_phase.phase_type,
    week = state.current_phase.week_number,
    archived = state.phase_history.len(),
    "periodization state saved"
  );
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Transition Log
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionLogEntry {
  pub id: i64,
  pub from: PhaseType,
  pub to: Option<PhaseType>,
  pub trigger: String,
  pub confidence: f64,
  pub applied: bool,
  pub rationale: String,
  pub decided_at: DateTime<Utc>,
}

fn trigger_name(trigger: TransitionTrigger) -> &'static str {
  match trigger {
    TransitionTrigger::TimeElapsed => "time_elapsed",
    TransitionTrigger::PlateauRisk => "plateau_risk",
    TransitionTrigger::Stagnation => "stagnation",
    TransitionTrigger::DeloadComplete => "deload_complete",
    TransitionTrigger::None => "none",
  }
}

/// Append a decision to the transition log
pub async fn log_transition(
  pool: &SqlitePool,
  decision: &TransitionDecision,
  applied: bool,
  decided_at: DateTime<Utc>,
) -> Result<i64, StoreError> {
  let mut conn = pool.acquire().await?;
  insert_transition(&mut conn, decision, applied, decided_at).await
}

/// Save the state and log the decision that produced it in one transaction.
/// Either both land or neither does.
pub async fn apply_transition(
  pool: &SqlitePool,
  state: &PeriodizationState,
  decision: &TransitionDecision,
  applied: bool,
  decided_at: DateTime<Utc>,
) -> Result<i64, StoreError> {
  let mut tx = pool.begin().await?;
  let id = insert_transition(&mut tx, decision, applied, decided_at).await?;
  write_state(&mut tx, state).await?;
  tx.commit().await?;
  Ok(id)
}

async fn insert_transition(
  conn: &mut SqliteConnection,
  decision: &TransitionDecision,
  applied: bool,
  decided_at: DateTime<Utc>,
) -> Result<i64, StoreError> {
  let result = sqlx::query(
    r#"
    INSERT INTO phase_transitions
      (from_phase, to_phase, trigger, confidence, applied, rationale, decided_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    "#,
  )
  .bind(decision.from.to_string())
  .bind(decision.to.map(|p| p.to_string()))
  .bind(trigger_name(decision.trigger))
  .bind(decision.confidence)
  .bind(applied)
  .bind(&decision.rationale)
  .bind(to_db_time(decided_at))
  .execute(&mut *conn)
  .await?;

  if applied {
    info!(
      from = %decision.from,
      to = ?decision.to,
      confidence = decision.confidence,
      "transition logged"
    );
  }
  Ok(result.last_insert_rowid())
}

/// Transition log, oldest first
pub async fn load_transition_log(pool: &SqlitePool) -> Result<Vec<TransitionLogEntry>, StoreError> {
  let rows = sqlx::query(
    r#"
    SELECT id, from_phase, to_phase, trigger, confidence, applied, rationale, decided_at
    FROM phase_transitions
    ORDER BY id ASC
    "#,
  )
  .fetch_all(pool)
  .await?;

  let parse_phase = |raw: &str| -> Result<PhaseType, StoreError> {
    raw.parse().map_err(StoreError::Corrupt)
  };

  let mut entries = Vec::with_capacity(rows.len());
  for row in rows {
    let from: String = row.get("from_phase");
    let to: Option<String> = row.get("to_phase");
    let decided_at: String = row.get("decided_at");
    entries.push(TransitionLogEntry {
      id: row.get("id"),
      from: parse_phase(&from)?,
      to: to.as_deref().map(parse_phase).transpose()?,
      trigger: row.get("trigger"),
      confidence: row.get("confidence"),
      applied: row.get("applied"),
      rationale: row.get("rationale"),
      decided_at: from_db_time(&decided_at)?,
    });
  }

  Ok(entries)
}
