//! Weekday/weekend split of individual trip emissions.

use serde::{Deserialize, Serialize};

use crate::model::TripRecord;

/// Result of the weekday/weekend split.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeasonalResult {
    /// Mean emission of Mon-Fri trips (0 if none).
    pub weekday_avg: f64,
    /// Mean emission of Sat/Sun trips (0 if none).
    pub weekend_avg: f64,
    /// Relative gap, normalized by the weekday mean (floored at 1).
    pub strength: f64,
    /// Whether the gap exceeds the threshold.
    pub has_pattern: bool,
}

/// Split trips by originating weekday and test for a material gap.
///
/// The gap is always divided by `max(weekday_avg, 1)`, so a weekend-heavy
/// user with almost no weekday travel reports a pattern.
#[must_use]
pub fn seasonal(trips: &[&TripRecord], threshold: f64) -> SeasonalResult {
    let (mut weekday_sum, mut weekday_count) = (0.0, 0usize);
    let (mut weekend_sum, mut weekend_count) = (0.0, 0usize);

    for trip in trips {
        if trip.is_weekend() {
            weekend_sum += trip.emission_kg;
            weekend_count += 1;
        } else {
            weekday_sum += trip.emission_kg;
            weekday_count += 1;
        }
    }

    let weekday_avg = mean(weekday_sum, weekday_count);
    let weekend_avg = mean(weekend_sum, weekend_count);
    let strength = (weekday_avg - weekend_avg).abs() / weekday_avg.max(1.0);

    SeasonalResult {
        weekday_avg,
        weekend_avg,
        strength,
        has_pattern: strength > threshold,
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
