//! Daily aggregation over a trailing window.
//!
//! Days without trips produce no entry at all. Every downstream statistic
//! (smoothing, trend, variability) runs over the present days only, so a
//! user who logs every third day looks the same as one who logs daily.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::TripRecord;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Summed trip emission for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    /// UTC calendar day.
    pub day: NaiveDate,
    /// Total emission, kg CO2e.
    pub emission_kg: f64,
}

/// Age of an instant in whole days, rounded up.
///
/// Instants in the future have a zero or negative age.
#[must_use]
pub fn age_in_days(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - timestamp).num_milliseconds() as f64 / 1000.0;
    (elapsed / SECONDS_PER_DAY).ceil() as i64
}

/// Trips whose age is within `window_days`, in input order.
#[must_use]
pub fn windowed_trips(trips: &[TripRecord], now: DateTime<Utc>, window_days: u32) -> Vec<&TripRecord> {
    trips
        .iter()
        .filter(|trip| age_in_days(trip.timestamp, now) <= i64::from(window_days))
        .collect()
}

/// Per-day emission totals in first-seen day order.
///
/// The order follows the input, not the calendar. Callers that hand in
/// trips out of date order get a series that is out of date order too.
#[must_use]
pub fn daily_totals(trips: &[&TripRecord]) -> Vec<DailyTotal> {
    let mut totals: IndexMap<NaiveDate, f64> = IndexMap::new();
    for trip in trips {
        *totals.entry(trip.day()).or_insert(0.0) += trip.emission_kg;
    }

    totals
        .into_iter()
        .map(|(day, emission_kg)| DailyTotal { day, emission_kg })
        .collect()
}

/// The emission values of a daily series.
#[must_use]
pub fn series_values(totals: &[DailyTotal]) -> Vec<f64> {
    totals.iter().map(|total| total.emission_kg).collect()
}
