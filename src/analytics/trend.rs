//! Least-squares trend over the daily series.

pub use crate::model::{TrendDirection, TrendSummary};

/// Minimum number of points before a slope is fitted.
pub const MIN_TREND_POINTS: usize = 3;

/// Fit and classify the trend of a series.
///
/// The x axis is the position in the series, not the calendar distance
/// between days. Fewer than three points yield a flat, stable trend.
#[must_use]
pub fn trend(series: &[f64], threshold: f64) -> TrendSummary {
    if series.len() < MIN_TREND_POINTS {
        return TrendSummary::default();
    }

    let slope = least_squares_slope(series);
    let direction = if slope > threshold {
        TrendDirection::Increasing
    } else if slope < -threshold {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    TrendSummary { slope, direction }
}

/// Ordinary least-squares slope with `x = 0..n-1`.
#[must_use]
pub fn least_squares_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, v)| i as f64 * v).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i * i) as f64).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}
