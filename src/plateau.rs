//! Plateau detection over a short window of recent sessions.
//!
//! The thresholds act on raw weight units, not the normalized weekly slope the
//! other consumers of `trend` use, so a 50 lb lift and a 500 lb lift are judged
//! on the same absolute scale.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ExerciseSession;
use crate::series::{MostRecentFirst, Ordered};
use crate::trend;

pub const DEFAULT_WINDOW: usize = 6;

/// Fewer usable sessions than this is noise, never a plateau
pub const MIN_SESSIONS: usize = 3;

/// Slope of best-set weight per session index
pub const SLOPE_THRESHOLD: f64 = 0.005;

/// Population variance of best-set weight
pub const VARIANCE_THRESHOLD: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateauAnalysisResult {
    pub plateau_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slope: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<f64>,
    pub considered_count: usize,
}

/// Detect a plateau in the default six-session window
pub fn detect_plateau(
    sessions: &Ordered<ExerciseSession, MostRecentFirst>,
) -> PlateauAnalysisResult {
    detect_plateau_in_window(sessions, DEFAULT_WINDOW)
}

/// Detect a plateau among the `window_size` most recent sessions.
///
/// Weights are indexed 0..n in recency order (index 0 is the newest session),
/// so the slope is over recency, not calendar time. Sessions with no sets are
/// skipped. Both the slope and the variance must be under their thresholds.
pub fn detect_plateau_in_window(
    sessions: &Ordered<ExerciseSession, MostRecentFirst>,
    window_size: usize,
) -> PlateauAnalysisResult {
    let weights: Vec<f64> = sessions
        .iter()
        .take(window_size)
        .filter_map(|s| s.best_set().map(|b| b.weight()))
        .collect();

    let n = weights.len();
    if n < MIN_SESSIONS {
        debug!(considered = n, "plateau check skipped, insufficient sessions");
        return PlateauAnalysisResult {
            plateau_detected: false,
            slope: None,
            variance: None,
            considered_count: n,
        };
    }

    let indexed: Vec<(f64, f64)> = weights
        .iter()
        .enumerate()
        .map(|(i, w)| (i as f64, *w))
        .collect();
    let slope = trend::ols_slope(&indexed);
    let variance = trend::population_variance(&weights);

    let plateau_detected = slope < SLOPE_THRESHOLD && variance < VARIANCE_THRESHOLD;
    debug!(considered = n, slope, variance, plateau_detected, "plateau check");

    PlateauAnalysisResult {
        plateau_detected,
        slope: Some(slope),
        variance: Some(variance),
        considered_count: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Set;
    use chrono::{Duration, Utc};

    /// Sessions listed newest first, one per week
    fn recent_first(weights: &[f64], reps: u32) -> Ordered<ExerciseSession, MostRecentFirst> {
        let now = Utc::now();
        Ordered::new(
            weights
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    ExerciseSession::new(now - Duration::weeks(i as i64), vec![Set::new(*w, reps)])
                })
                .collect(),
        )
    }

    #[test]
    fn test_identical_weights_plateau() {
        let result = detect_plateau(&recent_first(&[100.0, 100.0, 100.0, 100.0], 8));
        assert!(result.plateau_detected);
        assert_eq!(result.slope, Some(0.0));
        assert_eq!(result.variance, Some(0.0));
        assert_eq!(result.considered_count, 4);
    }

    #[test]
    fn test_increasing_weights_no_plateau() {
        // Climbing 100 -> 107.5 over four weeks, listed newest first
        let result = detect_plateau(&recent_first(&[107.5, 105.0, 102.5, 100.0], 8));
        assert!(result.slope.unwrap() < 0.0);
        assert!(result.variance.unwrap() >= VARIANCE_THRESHOLD);
        assert!(!result.plateau_detected);
    }

    #[test]
    fn test_declining_weights_no_plateau() {
        let result = detect_plateau(&recent_first(&[100.0, 102.5, 105.0, 107.5], 8));
        assert!(result.slope.unwrap() > SLOPE_THRESHOLD);
        assert!(!result.plateau_detected);
    }

    #[test]
    fn test_slow_climber_reads_as_plateau() {
        // Slope runs over recency index, so a gain reads as a negative slope
        // and only the variance gate can clear it
        let result = detect_plateau(&recent_first(&[102.0, 101.0, 100.0], 8));
        assert_eq!(result.slope, Some(-1.0));
        assert!(result.variance.unwrap() < VARIANCE_THRESHOLD);
        assert!(result.plateau_detected);
    }

    #[test]
    fn test_fewer_than_three_sessions_never_plateau() {
        for weights in [vec![], vec![100.0], vec![100.0, 100.0]] {
            let result = detect_plateau(&recent_first(&weights, 8));
            assert!(!result.plateau_detected);
            assert!(result.slope.is_none());
            assert!(result.variance.is_none());
        }
    }

    #[test]
    fn test_flat_but_noisy_is_not_plateau() {
        // Slope near zero, variance well above 2.5
        let result = detect_plateau(&recent_first(&[100.0, 110.0, 100.0, 110.0, 100.0], 5));
        assert!(result.variance.unwrap() >= VARIANCE_THRESHOLD);
        assert!(!result.plateau_detected);
    }

    #[test]
    fn test_window_limits_considered_sessions() {
        // Only the newest three are flat
        let result = detect_plateau_in_window(
            &recent_first(&[120.0, 120.0, 120.0, 100.0, 90.0, 80.0], 5),
            3,
        );
        assert_eq!(result.considered_count, 3);
        assert!(result.plateau_detected);
    }

    #[test]
    fn test_default_window_is_six() {
        let weights = vec![100.0; 10];
        let result = detect_plateau(&recent_first(&weights, 5));
        assert_eq!(result.considered_count, 6);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        // Built from an arbitrarily shuffled list; Ordered sorts newest first
        let now = Utc::now();
        let sessions = Ordered::new(vec![
            ExerciseSession::new(now - Duration::weeks(2), vec![Set::new(100.0, 8)]),
            ExerciseSession::new(now, vec![Set::new(100.0, 8)]),
            ExerciseSession::new(now - Duration::weeks(1), vec![Set::new(100.0, 8)]),
        ]);
        assert!(detect_plateau(&sessions).plateau_detected);
    }
}
