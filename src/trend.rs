//! Linear trend estimation
//!
//! Ordinary least-squares slope over a time-indexed series, normalized to
//! "fraction of the series mean per week". Every downstream heuristic reads
//! this one scalar.

use crate::series::{PerformanceSeries, TimePoint};

pub const MS_PER_DAY: f64 = 86_400_000.0;
pub const MS_PER_WEEK: f64 = MS_PER_DAY * 7.0;

/// Smallest plate-loading increment
pub const PLATE_INCREMENT: f64 = 2.5;

/// OLS slope of y over x. Fewer than two points or zero x-spread gives 0.
pub fn ols_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, y) in points {
        let dx = x - mean_x;
        numerator += dx * (y - mean_y);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Raw slope in value per millisecond
pub fn slope_per_ms(points: &[TimePoint]) -> f64 {
    let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.ts as f64, p.value)).collect();
    ols_slope(&xy)
}

/// Weekly change as a fraction of the series mean.
///
/// `slope_per_ms * ms_per_week / mean(value)`, or 0 when there is no signal
/// (under two points, all samples at one instant, or a zero mean).
pub fn weekly_fraction_slope(series: &PerformanceSeries) -> f64 {
    let points = series.as_slice();
    if points.len() < 2 {
        return 0.0;
    }

    let mean = points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }

    let slope = slope_per_ms(points);
    let weekly = slope * MS_PER_WEEK / mean;
    if weekly.is_finite() {
        weekly
    } else {
        0.0
    }
}

/// Direction of a normalized weekly slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Flat,
    Falling,
}

impl TrendDirection {
    /// Classify with a symmetric dead band around zero
    pub fn from_slope(weekly_fraction: f64, dead_band: f64) -> Self {
        if weekly_fraction > dead_band {
            Self::Rising
        } else if weekly_fraction < -dead_band {
            Self::Falling
        } else {
            Self::Flat
        }
    }
}

/// Round up to the next multiple of `increment`.
///
/// Always applied last, exactly once, to any weight handed to the user.
pub fn round_up_to_increment(value: f64, increment: f64) -> f64 {
    (value / increment).ceil() * increment
}

/// Round up to the next loadable plate weight
pub fn round_up_to_plate(value: f64) -> f64 {
    round_up_to_increment(value, PLATE_INCREMENT)
}

/// Population variance; 0 for an empty slice
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
