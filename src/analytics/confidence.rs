//! Multi-factor confidence score.
//!
//! Each factor is normalized to [0, 1], multiplied by its weight and
//! summed. The sum is clamped into `[floor, ceiling]`.

use serde::{Deserialize, Serialize};

use super::trend::MIN_TREND_POINTS;
use crate::config::{AnalysisConfig, ConfidenceConfig};

/// Signals the score is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs<'a> {
    /// Daily totals inside the window.
    pub daily_series: &'a [f64],
    /// Trips inside the window.
    pub windowed_trips: usize,
    /// Trend slope of the daily series.
    pub slope: f64,
    /// Seasonal strength of the windowed trips.
    pub seasonal_strength: f64,
    /// Fractional days since the most recent trip, if any.
    pub days_since_last_trip: Option<f64>,
    /// Whether any bill exists.
    pub has_bills: bool,
}

/// Weighted contribution of each factor, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    /// Distinct-day coverage.
    pub coverage: f64,
    /// Trip volume.
    pub volume: f64,
    /// Trend stability.
    pub stability: f64,
    /// Low day-to-day variability.
    pub variability: f64,
    /// Seasonal strength.
    pub seasonality: f64,
    /// Recency of the last trip.
    pub recency: f64,
    /// Bill presence.
    pub bills: f64,
    /// Final clamped score.
    pub score: f64,
}

impl ConfidenceBreakdown {
    /// Sum of the weighted factors, before clamping.
    #[must_use]
    pub fn raw(&self) -> f64 {
        self.coverage
            + self.volume
            + self.stability
            + self.variability
            + self.seasonality
            + self.recency
            + self.bills
    }
}

/// Score the inputs.
///
/// Stability needs enough points to fit a trend and variability needs at
/// least two points; below that those factors contribute nothing, so an
/// empty record set lands on the floor.
#[must_use]
pub fn confidence(inputs: &ConfidenceInputs<'_>, config: &AnalysisConfig) -> ConfidenceBreakdown {
    let weights: &ConfidenceConfig = &config.confidence;
    let series = inputs.daily_series;

    let coverage = capped(series.len() as f64 / weights.coverage_days) * weights.coverage_weight;
    let volume = capped(inputs.windowed_trips as f64 / weights.volume_trips) * weights.volume_weight;

    // An empty or one-day series has slope 0 and CoV 0, which would score
    // full stability and variability. Gating both keeps a record set with
    // no usable history at the floor.
    let stability = if series.len() >= MIN_TREND_POINTS {
        (1.0 - capped(inputs.slope.abs() / weights.slope_cap)) * weights.stability_weight
    } else {
        0.0
    };

    let variability = if series.len() >= 2 {
        (1.0 - capped(coefficient_of_variation(series) / weights.cov_cap)) * weights.variability_weight
    } else {
        0.0
    };

    let seasonality = if series.len() >= config.seasonal_min_days {
        capped(inputs.seasonal_strength / weights.seasonal_strength_cap) * weights.seasonality_weight
    } else {
        0.0
    };

    let recency = inputs.days_since_last_trip.map_or(0.0, |days| {
        (1.0 - days.max(0.0) / weights.recency_days).max(0.0) * weights.recency_weight
    });

    let bills = if inputs.has_bills { weights.bills_weight } else { 0.0 };

    let mut breakdown = ConfidenceBreakdown {
        coverage,
        volume,
        stability,
        variability,
        seasonality,
        recency,
        bills,
        score: 0.0,
    };
    breakdown.score = clamp_score(breakdown.raw(), weights);
    breakdown
}

/// Population standard deviation over mean, 0 when the mean is 0.
#[must_use]
pub fn coefficient_of_variation(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

fn capped(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

fn clamp_score(raw: f64, weights: &ConfidenceConfig) -> f64 {
    if raw.is_nan() {
        return weights.floor;
    }
    raw.clamp(weights.floor, weights.ceiling)
}
