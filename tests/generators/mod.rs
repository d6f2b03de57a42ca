//! Synthetic trip and bill generators.
//!
//! Every generator is deterministic: timestamps are derived from a fixed
//! reference instant so weekday-dependent assertions stay stable.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use footprint_insight::model::{TripRecord, UtilityBillRecord, Vehicle};
use serde_json::json;

/// Monday 2025-03-31, 20:00 UTC.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 31, 20, 0, 0).unwrap()
}

/// Configuration for a synthetic trip history.
#[derive(Debug, Clone)]
pub struct TripSeriesConfig {
    /// Number of consecutive days, counting back from the reference day.
    pub days: i64,
    /// Trips logged per day.
    pub trips_per_day: usize,
    /// Emission of each trip.
    pub emission_kg: f64,
    /// Distance of each trip.
    pub distance_km: f64,
    /// Vehicle used.
    pub vehicle: Vehicle,
}

impl Default for TripSeriesConfig {
    fn default() -> Self {
        Self {
            days: 10,
            trips_per_day: 1,
            emission_kg: 2.0,
            distance_km: 10.0,
            vehicle: Vehicle::Car,
        }
    }
}

impl TripSeriesConfig {
    /// A month of daily commuting.
    pub fn month() -> Self {
        Self {
            days: 30,
            ..Default::default()
        }
    }

    /// Generate the trips, oldest first.
    pub fn generate(&self) -> Vec<TripRecord> {
        let now = reference_now();
        let mut trips = Vec::new();
        for day in (0..self.days).rev() {
            for slot in 0..self.trips_per_day {
                let ts = now - Duration::days(day) - Duration::hours(slot as i64 + 1);
                trips.push(
                    TripRecord::new(ts, self.distance_km, self.emission_kg, self.vehicle.clone())
                        .unwrap(),
                );
            }
        }
        trips
    }
}

/// One trip per day on the 14 days Mon 2025-03-17 .. Sun 2025-03-30.
///
/// Weekday trips emit `weekday_kg`, weekend trips emit `weekend_kg`.
pub fn two_week_split(weekday_kg: f64, weekend_kg: f64) -> Vec<TripRecord> {
    let start = Utc.with_ymd_and_hms(2025, 3, 17, 12, 0, 0).unwrap();
    (0..14)
        .map(|i| {
            let ts = start + Duration::days(i);
            let weekend = i % 7 >= 5;
            let kg = if weekend { weekend_kg } else { weekday_kg };
            TripRecord::new(ts, 8.0, kg, Vehicle::Car).unwrap()
        })
        .collect()
}

/// A bill recorded at the reference instant.
pub fn bill(units_kwh: f64) -> UtilityBillRecord {
    UtilityBillRecord::from_consumption(reference_now(), "2025-03", units_kwh, 0.45).unwrap()
}

/// Write an import file in the `{"trips": [...], "bills": [...]}` shape.
pub fn write_import_file(dir: &Path, trips: &[TripRecord], bills: &[UtilityBillRecord]) -> PathBuf {
    let path = dir.join("records.json");
    let body = json!({ "trips": trips, "bills": bills });
    std::fs::write(&path, serde_json::to_vec_pretty(&body).unwrap()).unwrap();
    path
}
