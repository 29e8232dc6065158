//! Periodization Phase Engine
//!
//! Four-state block cycle:
//!
//! ```text
//! hypertrophy --(min weeks | plateau risk while stalled)--> strength
//! strength    --(min weeks | stagnation)-----------------> deload
//! deload      --(one week)-------------------------------> hypertrophy
//! power       (valid phase, never entered or left automatically)
//! ```
//!
//! Decisions are pure functions of (phase, inputs, now). The only mutable
//! piece is `PeriodizationState`, which callers own and serialize access to.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TransitionConfig;
use crate::models::{PeriodizationPhase, PhaseCustomization, PhaseType};
use crate::series::PerformanceSeries;
use crate::trend;

// ---------------------------------------------------------------------------
/// Confidence weights
// ---------------------------------------------------------------------------

const CONFIDENCE_BASE: f64 = 0.5;
const CONFIDENCE_MIN: f64 = 0.5;
const CONFIDENCE_MAX: f64 = 0.98;

/// Fixed stand-in for literature strength
const EVIDENCE_WEIGHT: f64 = 0.05;
const TIME_RATIO_WEIGHT: f64 = 0.2;
const DATA_SUFFICIENCY_WEIGHT: f64 = 0.1;
const VOLUME_DATA_WEIGHT: f64 = 0.02;

// ---------------------------------------------------------------------------
/// Decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// Phase reached its minimum length
    TimeElapsed,
    /// High plateau risk with stalled progression
    PlateauRisk,
    /// Progression slope fell below the stagnation threshold
    Stagnation,
    /// Deload week finished
    DeloadComplete,
    None,
}

impl TransitionTrigger {
    fn confidence_weight(&self, plateau_risk: f64) -> f64 {
        match self {
            Self::TimeElapsed => 0.1,
            Self::PlateauRisk => 0.1 * plateau_risk.clamp(0.0, 1.0),
            Self::Stagnation => 0.08,
            Self::DeloadComplete => 0.15,
            Self::None => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDecision {
    pub should_transition: bool,
    pub from: PhaseType,
    pub to: Option<PhaseType>,
    pub trigger: TransitionTrigger,
    /// UI-facing blend in [0.5, 0.98], not a probability
    pub confidence: f64,
    pub rationale: String,
    pub phase_age_weeks: i64,
    pub progression_slope: f64,
}

/// Signals the engine reads
#[derive(Debug, Clone, Copy)]
pub struct TransitionInputs<'a> {
    /// Chronological performance (e.g. best-set weight or estimated 1RM)
    pub progress: &'a PerformanceSeries,
    /// Composite plateau risk in [0, 1]
    pub plateau_risk: f64,
    /// Chronological weekly set counts, if tracked
    pub volume: Option<&'a PerformanceSeries>,
}

// ---------------------------------------------------------------------------
/// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PhaseEngine {
    pub config: TransitionConfig,
}

impl PhaseEngine {
    pub fn new(config: TransitionConfig) -> Self {
        Self { config }
    }

    fn min_weeks(&self, phase_type: PhaseType) -> Option<i64> {
        match phase_type {
            PhaseType::Hypertrophy => Some(self.config.hypertrophy_min_weeks),
            PhaseType::Strength => Some(self.config.strength_min_weeks),
            PhaseType::Deload => Some(self.config.deload_min_weeks),
            PhaseType::Power => None,
        }
    }

    /// Decide whether `phase` should end now
    pub fn evaluate(
        &self,
        phase: &PeriodizationPhase,
        inputs: &TransitionInputs<'_>,
        now: DateTime<Utc>,
    ) -> TransitionDecision {
        let cfg = &self.config;
        let age = phase.age_weeks(now);
        let slope = trend::weekly_fraction_slope(inputs.progress);
        let data_sufficient = inputs.progress.len() >= cfg.min_data_points;
        let min_weeks = self.min_weeks(phase.phase_type);
        let time_up = min_weeks.is_some_and(|m| age >= m);

        let (to, trigger, reason) = match phase.phase_type {
            PhaseType::Hypertrophy => {
                let stalled = inputs.plateau_risk > cfg.plateau_risk_threshold
                    && slope <= cfg.plateau_slope_ceiling
                    && data_sufficient;
                if time_up {
                    (
                        Some(PhaseType::Strength),
                        TransitionTrigger::TimeElapsed,
                        format!(
                            "Hypertrophy block complete ({} of {} minimum weeks)",
                            age, cfg.hypertrophy_min_weeks
                        ),
                    )
                } else if stalled {
                    (
                        Some(PhaseType::Strength),
                        TransitionTrigger::PlateauRisk,
                        format!(
                            "Plateau risk {:.2} above {:.2} with progression at {:.2}%/week",
                            inputs.plateau_risk,
                            cfg.plateau_risk_threshold,
                            slope * 100.0
                        ),
                    )
                } else {
                    (None, TransitionTrigger::None, String::new())
                }
            }
            PhaseType::Strength => {
                let stagnating = data_sufficient && slope < cfg.stagnation_threshold;
                if time_up {
                    (
                        Some(PhaseType::Deload),
                        TransitionTrigger::TimeElapsed,
                        format!(
                            "Strength block complete ({} of {} minimum weeks)",
                            age, cfg.strength_min_weeks
                        ),
                    )
                } else if stagnating {
                    (
                        Some(PhaseType::Deload),
                        TransitionTrigger::Stagnation,
                        format!(
                            "Progression stalled at {:.2}%/week (below {:.2}%)",
                            slope * 100.0,
                            cfg.stagnation_threshold * 100.0
                        ),
                    )
                } else {
                    (None, TransitionTrigger::None, String::new())
                }
            }
            PhaseType::Deload => {
                if time_up {
                    (
                        Some(PhaseType::Hypertrophy),
                        TransitionTrigger::DeloadComplete,
                        "Deload week complete, return to hypertrophy".to_string(),
                    )
                } else {
                    (None, TransitionTrigger::None, String::new())
                }
            }
            PhaseType::Power => (None, TransitionTrigger::None, String::new()),
        };

        let time_ratio = match min_weeks {
            Some(m) if m > 0 => (age as f64 / m as f64).clamp(0.0, 1.0),
            Some(_) => 1.0,
            None => 0.0,
        };
        let volume_tracked = inputs
            .volume
            .is_some_and(|v| v.len() >= cfg.min_data_points);

        let mut confidence = CONFIDENCE_BASE
            + EVIDENCE_WEIGHT
            + TIME_RATIO_WEIGHT * time_ratio
            + trigger.confidence_weight(inputs.plateau_risk);
        if data_sufficient {
            confidence += DATA_SUFFICIENCY_WEIGHT;
        }
        if volume_tracked {
            confidence += VOLUME_DATA_WEIGHT;
        }
        let confidence = confidence.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX);

        let should_transition = to.is_some();
        let rationale = if should_transition {
            reason
        } else {
            format!(
                "Continue current {} phase (week {} of {})",
                phase.phase_type, age, phase.total_weeks
            )
        };

        debug!(
            phase = %phase.phase_type,
            age,
            slope,
            plateau_risk = inputs.plateau_risk,
            should_transition,
            confidence,
            "phase transition evaluated"
        );

        TransitionDecision {
            should_transition,
            from: phase.phase_type,
            to,
            trigger,
            confidence,
            rationale,
            phase_age_weeks: age,
            progression_slope: slope,
        }
    }
}

// ---------------------------------------------------------------------------
/// State
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodizationError {
    #[error("Decision was made for a {decided} phase but the current phase is {current}")]
    StaleDecision {
        decided: PhaseType,
        current: PhaseType,
    },

    #[error("Decision does not propose a transition")]
    NoTransition,
}

/// Per-user periodization state. Owned by the caller, passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodizationState {
    pub current_phase: PeriodizationPhase,
    /// Completed phases, oldest first. Append-only.
    pub phase_history: Vec<PeriodizationPhase>,
    pub next_transition: DateTime<Utc>,
    pub auto_transitions: bool,
    #[serde(default)]
    pub customizations: BTreeMap<PhaseType, PhaseCustomization>,
}

/// Result of a weekly poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickOutcome {
    pub decision: TransitionDecision,
    /// True when the transition was applied during this tick
    pub applied: bool,
}

impl PeriodizationState {
    pub fn new(phase_type: PhaseType, now: DateTime<Utc>, auto_transitions: bool) -> Self {
        Self::with_customizations(phase_type, now, auto_transitions, BTreeMap::new())
    }

    pub fn with_customizations(
        phase_type: PhaseType,
        now: DateTime<Utc>,
        auto_transitions: bool,
        customizations: BTreeMap<PhaseType, PhaseCustomization>,
    ) -> Self {
        let current_phase =
            PeriodizationPhase::customized(phase_type, now, customizations.get(&phase_type));
        Self {
            next_transition: current_phase.end_date,
            current_phase,
            phase_history: Vec::new(),
            auto_transitions,
            customizations,
        }
    }

    pub fn evaluate(
        &self,
        engine: &PhaseEngine,
        inputs: &TransitionInputs<'_>,
        now: DateTime<Utc>,
    ) -> TransitionDecision {
        engine.evaluate(&self.current_phase, inputs, now)
    }

    /// Move into a new phase, archiving the current one
    pub fn transition_to(&mut self, phase_type: PhaseType, now: DateTime<Utc>) -> &PeriodizationPhase {
        let next =
            PeriodizationPhase::customized(phase_type, now, self.customizations.get(&phase_type));
        let previous = std::mem::replace(&mut self.current_phase, next);
        info!(
            from = %previous.phase_type,
            to = %phase_type,
            weeks = previous.week_number,
            "periodization phase transition"
        );
        self.phase_history.push(previous);
        self.next_transition = self.current_phase.end_date;
        &self.current_phase
    }

    /// Accept a proposed transition (manual mode)
    pub fn accept(
        &mut self,
        decision: &TransitionDecision,
        now: DateTime<Utc>,
    ) -> Result<&PeriodizationPhase, PeriodizationError> {
        if decision.from != self.current_phase.phase_type {
            return Err(PeriodizationError::StaleDecision {
                decided: decision.from,
                current: self.current_phase.phase_type,
            });
        }
        let to = match (decision.should_transition, decision.to) {
            (true, Some(to)) => to,
            _ => return Err(PeriodizationError::NoTransition),
        };
        Ok(self.transition_to(to, now))
    }

    /// Weekly tick of the current phase
    pub fn advance_week(&mut self) -> u32 {
        self.current_phase.week_number += 1;
        self.current_phase.week_number
    }

    /// Weekly poll: in auto mode the first qualifying transition is applied,
    /// otherwise the phase ages by one week and any proposal is left pending.
    pub fn weekly_tick(
        &mut self,
        engine: &PhaseEngine,
        inputs: &TransitionInputs<'_>,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        let decision = self.evaluate(engine, inputs, now);
        if decision.should_transition && self.auto_transitions {
            if let Some(to) = decision.to {
                self.transition_to(to, now);
                return TickOutcome {
                    decision,
                    applied: true,
                };
            }
        }

        self.advance_week();
        TickOutcome {
            decision,
            applied: false,
        }
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimePoint;
    use crate::trend::MS_PER_WEEK;
    use chrono::Duration;

    fn weekly(values: &[f64]) -> PerformanceSeries {
        PerformanceSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| TimePoint::new((i as f64 * MS_PER_WEEK) as i64, *v))
                .collect(),
        )
    }

    fn inputs<'a>(progress: &'a PerformanceSeries, risk: f64) -> TransitionInputs<'a> {
        TransitionInputs {
            progress,
            plateau_risk: risk,
            volume: None,
        }
    }

    fn phase_started(phase_type: PhaseType, weeks_ago: i64, now: DateTime<Utc>) -> PeriodizationPhase {
        PeriodizationPhase::new(phase_type, now - Duration::weeks(weeks_ago))
    }

    #[test]
    fn test_hypertrophy_continues_early() {
        let now = Utc::now();
        let progress = weekly(&[100.0, 102.5, 105.0, 107.5]);
        let decision = PhaseEngine::default().evaluate(
            &phase_started(PhaseType::Hypertrophy, 2, now),
            &inputs(&progress, 0.2),
            now,
        );
        assert!(!decision.should_transition);
        assert_eq!(decision.to, None);
        assert_eq!(decision.trigger, TransitionTrigger::None);
        assert!(decision.rationale.starts_with("Continue current hypertrophy phase"));
    }

    #[test]
    fn test_hypertrophy_to_strength_after_six_weeks() {
        let now = Utc::now();
        let progress = weekly(&[]);
        let decision = PhaseEngine::default().evaluate(
            &phase_started(PhaseType::Hypertrophy, 6, now),
            &inputs(&progress, 0.0),
            now,
        );
        assert!(decision.should_transition);
        assert_eq!(decision.to, Some(PhaseType::Strength));
        assert_eq!(decision.trigger, TransitionTrigger::TimeElapsed);
        assert_eq!(decision.phase_age_weeks, 6);
    }

    #[test]
    fn test_hypertrophy_plateau_trigger() {
        let now = Utc::now();
        let progress = weekly(&[100.0, 100.0, 100.0, 100.0]);
        let decision = PhaseEngine::default().evaluate(
            &phase_started(PhaseType::Hypertrophy, 3, now),
            &inputs(&progress, 0.8),
            now,
        );
        assert!(decision.should_transition);
        assert_eq!(decision.trigger, TransitionTrigger::PlateauRisk);
    }

    #[test]
    fn test_hypertrophy_plateau_needs_data() {
        let now = Utc::now();
        let progress = weekly(&[100.0, 100.0, 100.0]);
        let decision = PhaseEngine::default().evaluate(
            &phase_started(PhaseType::Hypertrophy, 3, now),
            &inputs(&progress, 0.9),
            now,
        );
        assert!(!decision.should_transition);
    }

    #[test]
    fn test_hypertrophy_plateau_ignored_while_progressing() {
        let now = Utc::now();
        // ~2.4%/week, above the 1% ceiling
        let progress = weekly(&[100.0, 102.5, 105.0, 107.5]);
        let decision = PhaseEngine::default().evaluate(
            &phase_started(PhaseType::Hypertrophy, 3, now),
            &inputs(&progress, 0.9),
            now,
        );
        assert!(!decision.should_transition);
    }

    #[test]
    fn test_strength_stagnation_trigger() {
        let now = Utc::now();
        let progress = weekly(&[150.0, 150.0, 150.0, 150.0]);
        let decision = PhaseEngine::default().evaluate(
            &phase_started(PhaseType::Strength, 1, now),
            &inputs(&progress, 0.0),
            now,
        );
        assert_eq!(decision.to, Some(PhaseType::Deload));
        assert_eq!(decision.trigger, TransitionTrigger::Stagnation);
    }

    #[test]
    fn test_strength_without_data_waits_for_time() {
        let now = Utc::now();
        let progress = weekly(&[]);
        let engine = PhaseEngine::default();

        let early = engine.evaluate(&phase_started(PhaseType::Strength, 2, now), &inputs(&progress, 0.0), now);
        assert!(!early.should_transition);

        let done = engine.evaluate(&phase_started(PhaseType::Strength, 4, now), &inputs(&progress, 0.0), now);
        assert_eq!(done.to, Some(PhaseType::Deload));
        assert_eq!(done.trigger, TransitionTrigger::TimeElapsed);
    }

    #[test]
    fn test_deload_returns_to_hypertrophy() {
        let now = Utc::now();
        let progress = weekly(&[]);
        let engine = PhaseEngine::default();
        let phase = PeriodizationPhase::new(PhaseType::Deload, now);

        let same_instant = engine.evaluate(&phase, &inputs(&progress, 0.0), now);
        assert!(!same_instant.should_transition);

        let later = engine.evaluate(&phase, &inputs(&progress, 0.0), now + Duration::days(2));
        assert_eq!(later.to, Some(PhaseType::Hypertrophy));
        assert_eq!(later.trigger, TransitionTrigger::DeloadComplete);
    }

    #[test]
    fn test_power_never_transitions() {
        let now = Utc::now();
        let progress = weekly(&[100.0, 100.0, 100.0, 100.0]);
        let decision = PhaseEngine::default().evaluate(
            &phase_started(PhaseType::Power, 20, now),
            &inputs(&progress, 1.0),
            now,
        );
        assert!(!decision.should_transition);
    }

    #[test]
    fn test_decision_is_deterministic() {
        let now = Utc::now();
        let progress = weekly(&[100.0, 101.0, 100.5, 101.0, 100.0]);
        let volume = weekly(&[12.0, 14.0, 15.0, 16.0]);
        let phase = phase_started(PhaseType::Hypertrophy, 4, now);
        let engine = PhaseEngine::default();
        let input = TransitionInputs {
            progress: &progress,
            plateau_risk: 0.75,
            volume: Some(&volume),
        };

        let first = engine.evaluate(&phase, &input, now);
        for _ in 0..10 {
            assert_eq!(engine.evaluate(&phase, &input, now), first);
        }
    }

    #[test]
    fn test_confidence_bounds() {
        let now = Utc::now();
        let progress = weekly(&[100.0; 8]);
        let volume = weekly(&[10.0; 8]);
        let engine = PhaseEngine::default();
        for phase_type in [PhaseType::Hypertrophy, PhaseType::Strength, PhaseType::Deload, PhaseType::Power] {
            for weeks in 0..10 {
                for risk in [0.0, 0.5, 1.0] {
                    let d = engine.evaluate(
                        &phase_started(phase_type, weeks, now),
                        &TransitionInputs { progress: &progress, plateau_risk: risk, volume: Some(&volume) },
                        now,
                    );
                    assert!(d.confidence >= 0.5 && d.confidence <= 0.98, "{}", d.confidence);
                }
            }
        }
    }

    #[test]
    fn test_state_auto_tick_applies_transition() {
        let start = Utc::now() - Duration::weeks(6);
        let mut state = PeriodizationState::new(PhaseType::Hypertrophy, start, true);
        let progress = weekly(&[]);
        let engine = PhaseEngine::default();

        let outcome = state.weekly_tick(&engine, &inputs(&progress, 0.0), Utc::now());
        assert!(outcome.applied);
        assert_eq!(state.current_phase.phase_type, PhaseType::Strength);
        assert_eq!(state.phase_history.len(), 1);
        assert_eq!(state.phase_history[0].phase_type, PhaseType::Hypertrophy);
        assert_eq!(state.next_transition, state.current_phase.end_date);
    }

    #[test]
    fn test_state_manual_tick_leaves_proposal_pending() {
        let start = Utc::now() - Duration::weeks(6);
        let mut state = PeriodizationState::new(PhaseType::Hypertrophy, start, false);
        let progress = weekly(&[]);
        let engine = PhaseEngine::default();
        let now = Utc::now();

        let outcome = state.weekly_tick(&engine, &inputs(&progress, 0.0), now);
        assert!(!outcome.applied);
        assert!(outcome.decision.should_transition);
        assert_eq!(state.current_phase.phase_type, PhaseType::Hypertrophy);
        assert_eq!(state.current_phase.week_number, 2);

        let phase = state.accept(&outcome.decision, now).expect("should accept");
        assert_eq!(phase.phase_type, PhaseType::Strength);
        assert_eq!(state.phase_history.len(), 1);
    }

    #[test]
    fn test_accept_rejects_stale_and_empty_decisions() {
        let now = Utc::now();
        let mut state = PeriodizationState::new(PhaseType::Strength, now, false);
        let progress = weekly(&[]);
        let engine = PhaseEngine::default();

        let no_op = state.evaluate(&engine, &inputs(&progress, 0.0), now);
        assert_eq!(state.accept(&no_op, now).unwrap_err(), PeriodizationError::NoTransition);

        let deload = PeriodizationPhase::new(PhaseType::Deload, now - Duration::weeks(1));
        let stale = engine.evaluate(&deload, &inputs(&progress, 0.0), now);
        assert_eq!(
            state.accept(&stale, now).unwrap_err(),
            PeriodizationError::StaleDecision {
                decided: PhaseType::Deload,
                current: PhaseType::Strength,
            }
        );
        assert!(state.phase_history.is_empty());
    }

    #[test]
    fn test_full_cycle_history_is_append_only() {
        let mut now = Utc::now();
        let mut state = PeriodizationState::new(PhaseType::Hypertrophy, now, true);
        let progress = weekly(&[]);
        let engine = PhaseEngine::default();

        let mut seen = Vec::new();
        for _ in 0..12 {
            now += Duration::weeks(1);
            if state.weekly_tick(&engine, &inputs(&progress, 0.0), now).applied {
                seen.push(state.current_phase.phase_type);
            }
        }
        assert_eq!(
            seen,
            vec![PhaseType::Strength, PhaseType::Deload, PhaseType::Hypertrophy]
        );
        let history: Vec<PhaseType> = state.phase_history.iter().map(|p| p.phase_type).collect();
        assert_eq!(
            history,
            vec![PhaseType::Hypertrophy, PhaseType::Strength, PhaseType::Deload]
        );
    }

    #[test]
    fn test_customized_phase_used_on_transition() {
        let now = Utc::now();
        let mut custom = BTreeMap::new();
        custom.insert(
            PhaseType::Strength,
            PhaseCustomization { total_weeks: Some(5), volume_multiplier: None },
        );
        let mut state = PeriodizationState::with_customizations(PhaseType::Hypertrophy, now, true, custom);
        state.transition_to(PhaseType::Strength, now);
        assert_eq!(state.current_phase.total_weeks, 5);
        assert_eq!(state.next_transition, now + Duration::weeks(5));
    }

    #[test]
    fn test_state_serializes_customizations() {
        let mut custom = BTreeMap::new();
        custom.insert(
            PhaseType::Deload,
            PhaseCustomization { total_weeks: None, volume_multiplier: Some(0.4) },
        );
        let state = PeriodizationState::with_customizations(PhaseType::Deload, Utc::now(), false, custom);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"deload\""));
        let back: PeriodizationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.customizations, state.customizations);
    }
}
