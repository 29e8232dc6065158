//! Recommendation bundle for one exercise
//!
//! Runs every calculator over the same history so the UI gets one consistent
//! snapshot: next-session target, plateau verdict, risk, forecast, phase
//! decision and weekly volume verdicts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CoachConfig;
use crate::forecast::{self, ForecastEntry};
use crate::models::{ExerciseSession, ExerciseType, ExperienceLevel, MuscleGroup};
use crate::periodization::{PeriodizationState, PhaseEngine, TransitionDecision, TransitionInputs};
use crate::plateau::{self, PlateauAnalysisResult};
use crate::progression::{self, ProgressionRecommendation};
use crate::research::Analysis;
use crate::risk::{RiskAssessment, RiskFactors};
use crate::series::{Chronological, MostRecentFirst, Ordered, PerformanceSeries};
use crate::volume::{self, VolumeVerdict};

/// ---------------------------------------------------------------------------
/// Request / Bundle
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecommendationRequest<'a> {
  pub exercise_type: ExerciseType,
  pub experience: ExperienceLevel,
  pub history: &'a Ordered<ExerciseSession, Chronological>,
  /// Sets logged this week per muscle group
  pub weekly_sets: &'a BTreeMap<MuscleGroup, u32>,
  /// Chronological weekly set totals, if tracked
  pub volume_series: Option<&'a PerformanceSeries>,
  pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBundle {
  /// None when nothing has been logged
  pub progression: Option<ProgressionRecommendation>,
  pub plateau: PlateauAnalysisResult,
  pub risk: RiskAssessment,
  pub forecast: Analysis<ForecastEntry>,
  pub transition: TransitionDecision,
  pub volume: Vec<VolumeVerdict>,
}

/// ---------------------------------------------------------------------------
/// Coach
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Coach {
  pub config: CoachConfig,
  engine: PhaseEngine,
}

impl Coach {
  pub fn new(config: CoachConfig) -> Self {
    let engine = PhaseEngine::new(config.transitions.clone());
    Self { config, engine }
  }

  pub fn engine(&self) -> &PhaseEngine {
    &self.engine
  }

  /// Compute the full bundle. Reads `state` but never mutates it.
  pub fn recommend(
    &self,
    state: &PeriodizationState,
    request: &RecommendationRequest<'_>,
  ) -> RecommendationBundle {
    let phase = &state.current_phase;
    let recent: Ordered<ExerciseSession, MostRecentFirst> = request.history.clone().reorder();

    let progression =
      progression::recommend_from_history(request.exercise_type, &recent, request.now);
    let plateau = plateau::detect_plateau_in_window(&recent, self.config.plateau_window);

    let factors = RiskFactors::from_history(request.history, request.volume_series, phase, request.now);
    let risk = RiskAssessment::from_factors(factors);

    let forecast = forecast::forecast(
      request.history,
      request.experience,
      phase.phase_type,
      self.config.forecast_horizon_weeks,
    );

    let progress = progression::best_weight_series(request.history);
    let inputs = TransitionInputs {
      progress: &progress,
      plateau_risk: risk.composite_risk,
      volume: request.volume_series,
    };
    let transition = state.evaluate(&self.engine, &inputs, request.now);

    let volume = request
      .weekly_sets
      .iter()
      .map(|(group, sets)| volume::classify_volume(*group, phase.phase_type, *sets))
      .collect();

    debug!(
      phase = %phase.phase_type,
      sessions = request.history.len(),
      plateau = plateau.plateau_detected,
      transition = transition.should_transition,
      "recommendation bundle built"
    );

    RecommendationBundle {
      progression,
      plateau,
      risk,
      forecast,
      transition,
      volume,
    }
  }
}
