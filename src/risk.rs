//! Plateau risk scoring
//!
//! Two scores share the [0, 1] range. `plateau_risk` is the single-factor
//! slope mapping; `composite_risk` blends five factors around a 0.5 baseline
//! and is what the phase engine consumes. A flat trend alone never pushes
//! the single-factor score past 0.5.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ExerciseSession, PeriodizationPhase};
use crate::progression;
use crate::series::{Chronological, MostRecentFirst, Ordered, PerformanceSeries};
use crate::volume;

const BASELINE: f64 = 0.5;

const PROGRESSION_WEIGHT: f64 = 0.35;
const VOLUME_WEIGHT: f64 = 0.25;
const RECOVERY_WEIGHT: f64 = 0.20;
const FREQUENCY_WEIGHT: f64 = 0.15;
const TIME_IN_PHASE_WEIGHT: f64 = 0.05;

/// RPE at or below this carries no recovery debt
const RPE_DEBT_FLOOR: f64 = 7.0;
const RPE_DEBT_SPAN: f64 = 3.0;

pub const DEFAULT_RECOVERY_WINDOW: usize = 4;

/// `clamp(0.5 - slope, 0, 1)`: flat or falling trend reads as elevated risk
pub fn plateau_risk(weekly_slope: f64) -> f64 {
    let risk = (BASELINE - weekly_slope).clamp(0.0, 1.0);
    if risk.is_nan() {
        BASELINE
    } else {
        risk
    }
}

/// ---------------------------------------------------------------------------
/// Composite Risk
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    /// Weekly-fraction slope of best-set weight
    pub progression_slope: f64,
    /// Weekly-fraction slope of weekly set counts
    pub volume_slope: f64,
    /// 0 (fresh) to 1 (every recent session at RPE 10)
    pub recovery_debt: f64,
    /// Coefficient of variation of the gaps between sessions, clamped to [0, 1]
    pub frequency_variability: f64,
    /// Fraction of the current phase already elapsed
    pub time_in_phase: f64,
}

impl RiskFactors {
    /// Derive every factor from logged history and the current phase
    pub fn from_history(
        history: &Ordered<ExerciseSession, Chronological>,
        weekly_volume: Option<&PerformanceSeries>,
        phase: &PeriodizationPhase,
        now: DateTime<Utc>,
    ) -> Self {
        let recent: Ordered<ExerciseSession, MostRecentFirst> = history.clone().reorder();
        Self {
            progression_slope: progression::progression_rate(history),
            volume_slope: weekly_volume.map(volume::volume_progression).unwrap_or(0.0),
            recovery_debt: recovery_debt(&recent, DEFAULT_RECOVERY_WINDOW),
            frequency_variability: frequency_variability(history),
            time_in_phase: time_in_phase(phase, now),
        }
    }
}

/// Weighted blend around 0.5. Rising trends lower risk, the rest raise it.
pub fn composite_risk(factors: &RiskFactors) -> f64 {
    let score = BASELINE
        + PROGRESSION_WEIGHT * -factors.progression_slope
        + VOLUME_WEIGHT * -factors.volume_slope
        + RECOVERY_WEIGHT * factors.recovery_debt
        + FREQUENCY_WEIGHT * factors.frequency_variability
        + TIME_IN_PHASE_WEIGHT * factors.time_in_phase;
    if score.is_nan() {
        return BASELINE;
    }
    score.clamp(0.0, 1.0)
}

/// Irregularity of training frequency. Under two gaps there is nothing to vary.
pub fn frequency_variability(history: &Ordered<ExerciseSession, Chronological>) -> f64 {
    let sessions = history.as_slice();
    let gaps: Vec<f64> = sessions
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_milliseconds() as f64)
        .collect();
    if gaps.len() < 2 {
        return 0.0;
    }

    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let std_dev = crate::trend::population_variance(&gaps).sqrt();
    (std_dev / mean).clamp(0.0, 1.0)
}

/// Mean RPE excess over the `window` most recent sessions
pub fn recovery_debt(sessions: &Ordered<ExerciseSession, MostRecentFirst>, window: usize) -> f64 {
    let recent: Vec<&ExerciseSession> = sessions.iter().take(window).collect();
    if recent.is_empty() {
        return 0.0;
    }

    let total: f64 = recent
        .iter()
        .map(|s| match s.average_rpe() {
            Some(rpe) => ((rpe - RPE_DEBT_FLOOR) / RPE_DEBT_SPAN).clamp(0.0, 1.0),
            None => 0.0,
        })
        .sum();
    total / recent.len() as f64
}

/// Phase age over planned length, clamped to [0, 1]
pub fn time_in_phase(phase: &PeriodizationPhase, now: DateTime<Utc>) -> f64 {
    if phase.total_weeks == 0 {
        return 1.0;
    }
    (phase.age_weeks(now) as f64 / phase.total_weeks as f64).clamp(0.0, 1.0)
}

/// ---------------------------------------------------------------------------
/// Assessment
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            Self::High
        } else if score >= 0.4 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Slope-only score
    pub plateau_risk: f64,
    /// Five-factor score fed to the phase engine
    pub composite_risk: f64,
    pub level: RiskLevel,
    pub factors: RiskFactors,
}

impl RiskAssessment {
    pub fn from_factors(factors: RiskFactors) -> Self {
        let composite = composite_risk(&factors);
        Self {
            plateau_risk: plateau_risk(factors.progression_slope),
            composite_risk: composite,
            level: RiskLevel::from_score(composite),
            factors,
        }
    }
}
