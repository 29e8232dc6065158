//! Progressive Overload Calculator
//!
//! Decides whether the next session should carry more weight:
//! - a rep gate per exercise type must be cleared first
//! - the increase follows a conservative weekly rate, scaled by time elapsed
//! - the result is always rounded UP to a loadable plate weight
//!
//! Pure and infallible: bad inputs propagate through the arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{ExerciseSession, ExerciseType};
use crate::series::{Chronological, MostRecentFirst, Ordered, PerformanceSeries, TimePoint};
use crate::trend::{self, PLATE_INCREMENT};

// ---------------------------------------------------------------------------
/// Rules per exercise type
// ---------------------------------------------------------------------------

/// Minimum reps at the working weight before progressing
pub const COMPOUND_REP_GATE: u32 = 10;
pub const ISOLATION_REP_GATE: u32 = 12;

/// Expected strength gain per week (fraction of working weight)
pub const COMPOUND_WEEKLY_RATE: f64 = 0.0035;
pub const ISOLATION_WEEKLY_RATE: f64 = 0.005;

/// Never credit less than half a week of adaptation
pub const MIN_SESSIONS_FACTOR: f64 = 0.5;

/// Reps to restart at after a weight increase
pub const COMPOUND_RESET_REPS: u32 = 8;
pub const ISOLATION_RESET_REPS: u32 = 10;

impl ExerciseType {
    pub fn rep_gate(&self) -> u32 {
        match self {
            ExerciseType::Compound => COMPOUND_REP_GATE,
            ExerciseType::Isolation => ISOLATION_REP_GATE,
        }
    }

    pub fn weekly_rate(&self) -> f64 {
        match self {
            ExerciseType::Compound => COMPOUND_WEEKLY_RATE,
            ExerciseType::Isolation => ISOLATION_WEEKLY_RATE,
        }
    }

    pub fn reset_reps(&self) -> u32 {
        match self {
            ExerciseType::Compound => COMPOUND_RESET_REPS,
            ExerciseType::Isolation => ISOLATION_RESET_REPS,
        }
    }
}

// ---------------------------------------------------------------------------
/// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionMeta {
    pub weekly_rate: f64,
    pub sessions_factor: f64,
    pub rounding_increment: f64,
}

/// Derived per call, never a source of truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRecommendation {
    pub should_progress: bool,
    pub recommended_weight: f64,
    pub recommended_reps: u32,
    pub rationale: String,
    pub meta: ProgressionMeta,
}

/// `max(days / 7, 0.5)`
pub fn sessions_factor(days_since_last_session: f64) -> f64 {
    (days_since_last_session / 7.0).max(MIN_SESSIONS_FACTOR)
}

/// Decide the next working weight from the last best set.
pub fn calculate_progression(
    exercise_type: ExerciseType,
    current_weight: f64,
    achieved_reps: u32,
    days_since_last_session: f64,
) -> ProgressionRecommendation {
    let gate = exercise_type.rep_gate();
    let weekly_rate = exercise_type.weekly_rate();
    let factor = sessions_factor(days_since_last_session);
    let meta = ProgressionMeta {
        weekly_rate,
        sessions_factor: factor,
        rounding_increment: PLATE_INCREMENT,
    };

    if achieved_reps < gate {
        let target_reps = (achieved_reps + 1).min(gate);
        debug!(
            %exercise_type,
            achieved_reps,
            gate,
            "progression held, rep gate not cleared"
        );
        return ProgressionRecommendation {
            should_progress: false,
            recommended_weight: current_weight,
            recommended_reps: target_reps,
            rationale: format!(
                "Hold {} for {} reps: {} of {} reps needed to progress a {} lift",
                current_weight, target_reps, achieved_reps, gate, exercise_type
            ),
            meta,
        };
    }

    let raw = current_weight * (1.0 + weekly_rate * factor);
    let recommended_weight = trend::round_up_to_plate(raw);
    let reset_reps = exercise_type.reset_reps();

    debug!(
        %exercise_type,
        current_weight,
        raw,
        recommended_weight,
        "progression allowed"
    );

    ProgressionRecommendation {
        should_progress: true,
        recommended_weight,
        recommended_reps: reset_reps,
        rationale: format!(
            "Hit {} reps (gate {}): increase to {} x {} ({:.2}%/week over {:.1} weeks, rounded up to {})",
            achieved_reps,
            gate,
            recommended_weight,
            reset_reps,
            weekly_rate * 100.0,
            factor,
            PLATE_INCREMENT
        ),
        meta,
    }
}

/// Recommend the next session from a logged history.
///
/// Uses the best set of the most recent session that has any sets. `None`
/// when nothing usable has been logged.
pub fn recommend_from_history(
    exercise_type: ExerciseType,
    history: &Ordered<ExerciseSession, MostRecentFirst>,
    now: DateTime<Utc>,
) -> Option<ProgressionRecommendation> {
    let (session, best) = history
        .iter()
        .find_map(|s| s.best_set().map(|b| (s, b)))?;

    let days = (now - session.date).num_milliseconds() as f64 / trend::MS_PER_DAY;
    Some(calculate_progression(
        exercise_type,
        best.weight(),
        best.reps(),
        days,
    ))
}

/// Best-set weight per session, oldest first
pub fn best_weight_series(history: &Ordered<ExerciseSession, Chronological>) -> PerformanceSeries {
    PerformanceSeries::new(
        history
            .iter()
            .filter_map(|s| {
                s.best_set()
                    .map(|b| TimePoint::new(s.date.timestamp_millis(), b.weight()))
            })
            .collect(),
    )
}

/// Observed weekly progression rate (fraction of mean best-set weight)
pub fn progression_rate(history: &Ordered<ExerciseSession, Chronological>) -> f64 {
    trend::weekly_fraction_slope(&best_weight_series(history))
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
