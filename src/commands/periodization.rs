//! Periodization commands
//!
//! The stored state is the single source of truth; every mutating command
//! loads it, applies one change and saves it back.

use chrono::{DateTime, Utc};
use tracing::info;

use super::progression::chronological_history;
use super::CommandError;
use crate::db::AppState;
use crate::models::{PeriodizationPhase, PhaseCustomization, PhaseType};
use crate::periodization::{PeriodizationState, PhaseEngine, TickOutcome, TransitionDecision, TransitionInputs};
use crate::progression;
use crate::risk::{self, RiskFactors};
use crate::series::PerformanceSeries;
use crate::store::{self, StoreError};

/// Phase every new user starts in
pub const INITIAL_PHASE: PhaseType = PhaseType::Hypertrophy;

/// Load the stored state, creating and saving a fresh hypertrophy block if none exists
pub async fn get_or_init_state(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<PeriodizationState, CommandError> {
    if let Some(existing) = store::load_periodization_state(&state.db).await? {
        return Ok(existing);
    }

    let fresh = PeriodizationState::new(INITIAL_PHASE, now, state.config.auto_transitions);
    store::save_periodization_state(&state.db, &fresh).await?;
    info!(phase = %INITIAL_PHASE, "periodization state initialized");
    Ok(fresh)
}

async fn load_existing(state: &AppState) -> Result<PeriodizationState, CommandError> {
    store::load_periodization_state(&state.db)
        .await?
        .ok_or_else(|| StoreError::NotFound("periodization state".to_string()).into())
}

/// What the engine reads from the tracked exercise's history
struct Signals {
    progress: PerformanceSeries,
    plateau_risk: f64,
}

impl Signals {
    async fn load(
        state: &AppState,
        exercise: &str,
        phase: &PeriodizationPhase,
        weekly_volume: Option<&PerformanceSeries>,
        now: DateTime<Utc>,
    ) -> Result<Self, CommandError> {
        let history = chronological_history(state, exercise).await?;
        let factors = RiskFactors::from_history(&history, weekly_volume, phase, now);
        Ok(Self {
            progress: progression::best_weight_series(&history),
            plateau_risk: risk::composite_risk(&factors),
        })
    }

    fn inputs<'a>(&'a self, weekly_volume: Option<&'a PerformanceSeries>) -> TransitionInputs<'a> {
        TransitionInputs {
            progress: &self.progress,
            plateau_risk: self.plateau_risk,
            volume: weekly_volume,
        }
    }
}

/// Evaluate the current phase against the tracked exercise without changing anything
pub async fn evaluate_phase(
    state: &AppState,
    exercise: &str,
    weekly_volume: Option<&PerformanceSeries>,
    now: DateTime<Utc>,
) -> Result<TransitionDecision, CommandError> {
    let periodization = get_or_init_state(state, now).await?;
    let signals = Signals::load(state, exercise, &periodization.current_phase, weekly_volume, now).await?;
    let engine = PhaseEngine::new(state.config.transitions.clone());
    Ok(periodization.evaluate(&engine, &signals.inputs(weekly_volume), now))
}

/// Weekly poll.
///
/// In auto mode a qualifying transition is applied; otherwise the week number
/// advances and any proposal waits for `accept_transition`. Proposals are
/// logged either way, in the same transaction as the state save.
pub async fn weekly_tick(
    state: &AppState,
    exercise: &str,
    weekly_volume: Option<&PerformanceSeries>,
    now: DateTime<Utc>,
) -> Result<TickOutcome, CommandError> {
    let mut periodization = get_or_init_state(state, now).await?;
    let signals = Signals::load(state, exercise, &periodization.current_phase, weekly_volume, now).await?;
    let engine = PhaseEngine::new(state.config.transitions.clone());

    let outcome = periodization.weekly_tick(&engine, &signals.inputs(weekly_volume), now);
    if outcome.decision.should_transition {
        store::apply_transition(&state.db, &periodization, &outcome.decision, outcome.applied, now).await?;
    } else {
        store::save_periodization_state(&state.db, &periodization).await?;
    }

    Ok(outcome)
}

/// Apply a pending proposal (manual mode)
pub async fn accept_transition(
    state: &AppState,
    decision: &TransitionDecision,
    now: DateTime<Utc>,
) -> Result<PeriodizationPhase, CommandError> {
    let mut periodization = load_existing(state).await?;
    let phase = periodization.accept(decision, now)?.clone();

    store::apply_transition(&state.db, &periodization, decision, true, now).await?;

    Ok(phase)
}

/// Switch between automatic and manual transitions
pub async fn set_auto_transitions(
    state: &AppState,
    enabled: bool,
    now: DateTime<Utc>,
) -> Result<PeriodizationState, CommandError> {
    let mut periodization = get_or_init_state(state, now).await?;
    periodization.auto_transitions = enabled;
    store::save_periodization_state(&state.db, &periodization).await?;
    Ok(periodization)
}

/// Override a phase's template. Takes effect the next time that phase starts.
pub async fn customize_phase(
    state: &AppState,
    phase_type: PhaseType,
    customization: PhaseCustomization,
    now: DateTime<Utc>,
) -> Result<PeriodizationState, CommandError> {
    store::validate_customization(&customization)?;
    let mut periodization = get_or_init_state(state, now).await?;
    periodization.customizations.insert(phase_type, customization);
    store::save_periodization_state(&state.db, &periodization).await?;
    Ok(periodization)
}
