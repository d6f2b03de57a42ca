//! Frequency patterns over the full trip history.

use indexmap::IndexMap;

use crate::config::AnalysisConfig;
use crate::model::{
    weekday_label, DayCount, DistanceTiers, PatternSummary, TripRecord, VehicleUsage,
};

/// Mine weekday, vehicle and distance patterns from every trip.
///
/// Counting runs over all trips, not just the trailing window. Ties in
/// peak days and most-used vehicle go to whichever label was seen first.
#[must_use]
pub fn mine_patterns(trips: &[TripRecord], config: &AnalysisConfig) -> PatternSummary {
    let mut weekdays: IndexMap<&'static str, usize> = IndexMap::new();
    let mut vehicles: IndexMap<String, usize> = IndexMap::new();
    let mut tiers = DistanceTiers::default();
    let mut total_distance_km = 0.0;

    for trip in trips {
        *weekdays.entry(weekday_label(trip.weekday())).or_insert(0) += 1;
        *vehicles.entry(trip.vehicle.label().to_string()).or_insert(0) += 1;

        if trip.distance_km < config.short_trip_km {
            tiers.short += 1;
        } else if trip.distance_km < config.long_trip_km {
            tiers.medium += 1;
        } else {
            tiers.long += 1;
        }
        total_distance_km += trip.distance_km;
    }

    let total_trips = trips.len();
    let most_used_vehicle = first_max(&vehicles).map(str::to_string);

    let vehicle_usage = vehicles
        .into_iter()
        .map(|(vehicle, count)| VehicleUsage {
            vehicle,
            count,
            share: count as f64 / total_trips as f64,
        })
        .collect();

    PatternSummary {
        peak_days: peak_days(&weekdays, config.peak_day_count),
        weekday_counts: weekdays
            .iter()
            .map(|(day, count)| DayCount {
                day: (*day).to_string(),
                count: *count,
            })
            .collect(),
        vehicle_usage,
        most_used_vehicle,
        distance_tiers: tiers,
        total_trips,
        total_distance_km,
        average_distance_km: if total_trips == 0 {
            0.0
        } else {
            total_distance_km / total_trips as f64
        },
    }
}

/// Top `n` labels by count; the stable sort keeps first-seen order on ties.
fn peak_days(counts: &IndexMap<&'static str, usize>, n: usize) -> Vec<String> {
    let mut ranked: Vec<(&str, usize)> = counts.iter().map(|(day, count)| (*day, *count)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(n).map(|(day, _)| day.to_string()).collect()
}

fn first_max(counts: &IndexMap<String, usize>) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for (label, &count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}
