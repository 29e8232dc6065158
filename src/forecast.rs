//! Performance forecasting
//!
//! Projects an estimated 1RM forward from its recent weekly trend. Growth is
//! scaled down with training age and by phase; a forecast never predicts a
//! decline below current performance.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{estimate_one_rep_max, ExerciseSession, ExperienceLevel, PhaseType};
use crate::research::Analysis;
use crate::series::{Chronological, Ordered, PerformanceSeries, TimePoint};
use crate::trend;

pub const DEFAULT_HORIZON_WEEKS: f64 = 12.0;

const CONFIDENCE_BASE: f64 = 0.3;
const CONFIDENCE_PER_POINT: f64 = 0.1;
const CONFIDENCE_CAP: f64 = 0.9;

pub fn phase_multiplier(phase: PhaseType) -> f64 {
    match phase {
        PhaseType::Strength => 1.1,
        PhaseType::Deload => 0.6,
        _ => 1.0,
    }
}

/// `current * (1 + max(slope, 0) * experience * phase * horizon)`, floored at `current`
pub fn predict_max(
    current_max: f64,
    weekly_slope: f64,
    experience: ExperienceLevel,
    phase: PhaseType,
    horizon_weeks: f64,
) -> f64 {
    let growth = weekly_slope.max(0.0)
        * experience.gain_multiplier()
        * phase_multiplier(phase)
        * horizon_weeks;
    (current_max * (1.0 + growth)).max(current_max)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    pub current_max: f64,
    pub predicted_max: f64,
    pub horizon_weeks: f64,
    pub weekly_slope: f64,
    pub experience: ExperienceLevel,
    pub phase: PhaseType,
    pub confidence: f64,
    pub data_points: usize,
}

/// Estimated 1RM of each session's best set, oldest first
pub fn one_rep_max_series(history: &Ordered<ExerciseSession, Chronological>) -> PerformanceSeries {
    PerformanceSeries::new(
        history
            .iter()
            .filter_map(|s| {
                s.best_set().map(|b| {
                    TimePoint::new(
                        s.date.timestamp_millis(),
                        estimate_one_rep_max(b.weight(), b.reps()),
                    )
                })
            })
            .collect(),
    )
}

/// Forecast the estimated 1RM `horizon_weeks` ahead.
///
/// Unavailable when the history holds no sets at all.
pub fn forecast(
    history: &Ordered<ExerciseSession, Chronological>,
    experience: ExperienceLevel,
    phase: PhaseType,
    horizon_weeks: f64,
) -> Analysis<ForecastEntry> {
    let series = one_rep_max_series(history);
    let current_max = match series.as_slice().last() {
        Some(point) => point.value,
        None => {
            return Analysis::unavailable(
                "performance forecast",
                "no logged sets to estimate a current max from",
            )
        }
    };

    let weekly_slope = trend::weekly_fraction_slope(&series);
    let predicted_max = predict_max(current_max, weekly_slope, experience, phase, horizon_weeks);
    let data_points = series.len();
    let confidence =
        (CONFIDENCE_BASE + CONFIDENCE_PER_POINT * (data_points - 1) as f64).min(CONFIDENCE_CAP);

    debug!(current_max, predicted_max, weekly_slope, data_points, "forecast computed");

    Analysis::Computed(ForecastEntry {
        current_max,
        predicted_max,
        horizon_weeks,
        weekly_slope,
        experience,
        phase,
        confidence,
        data_points,
    })
}
