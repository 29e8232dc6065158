//! Progression, plateau and forecast commands

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{periodization, CommandError, HISTORY_LIMIT};
use crate::coach::{Coach, RecommendationBundle, RecommendationRequest};
use crate::db::AppState;
use crate::forecast::{self, ForecastEntry};
use crate::models::{ExerciseSession, ExerciseType, ExperienceLevel, MuscleGroup};
use crate::plateau::{self, PlateauAnalysisResult};
use crate::progression::{self, ProgressionRecommendation};
use crate::research::Analysis;
use crate::series::{Chronological, Ordered, PerformanceSeries};
use crate::store;

/// Next-session target for an exercise. `None` until a set has been logged.
pub async fn recommend_next(
    state: &AppState,
    exercise: &str,
    exercise_type: ExerciseType,
    now: DateTime<Utc>,
) -> Result<Option<ProgressionRecommendation>, CommandError> {
    let history = store::load_history(&state.db, exercise, HISTORY_LIMIT).await?;
    Ok(progression::recommend_from_history(exercise_type, &history, now))
}

/// Plateau check over the configured window of recent sessions
pub async fn check_plateau(
    state: &AppState,
    exercise: &str,
) -> Result<PlateauAnalysisResult, CommandError> {
    let window = state.config.plateau_window;
    let history = store::load_history(&state.db, exercise, window as u32).await?;
    Ok(plateau::detect_plateau_in_window(&history, window))
}

/// Estimated 1RM forecast under the current phase
pub async fn forecast_performance(
    state: &AppState,
    exercise: &str,
    experience: ExperienceLevel,
    now: DateTime<Utc>,
) -> Result<Analysis<ForecastEntry>, CommandError> {
    let history = chronological_history(state, exercise).await?;
    let periodization = periodization::get_or_init_state(state, now).await?;
    Ok(forecast::forecast(
        &history,
        experience,
        periodization.current_phase.phase_type,
        state.config.forecast_horizon_weeks,
    ))
}

/// Every recommendation for an exercise in one snapshot
pub async fn get_recommendation_bundle(
    state: &AppState,
    exercise: &str,
    exercise_type: ExerciseType,
    experience: ExperienceLevel,
    weekly_sets: &BTreeMap<MuscleGroup, u32>,
    volume_series: Option<&PerformanceSeries>,
    now: DateTime<Utc>,
) -> Result<RecommendationBundle, CommandError> {
    let history = chronological_history(state, exercise).await?;
    let periodization = periodization::get_or_init_state(state, now).await?;
    let coach = Coach::new(state.config.clone());

    Ok(coach.recommend(
        &periodization,
        &RecommendationRequest {
            exercise_type,
            experience,
            history: &history,
            weekly_sets,
            volume_series,
            now,
        },
    ))
}

pub(crate) async fn chronological_history(
    state: &AppState,
    exercise: &str,
) -> Result<Ordered<ExerciseSession, Chronological>, CommandError> {
    let history = store::load_history(&state.db, exercise, HISTORY_LIMIT).await?;
    Ok(history.reorder())
}
