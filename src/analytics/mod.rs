//! Analytics core for trip and bill records.
//!
//! This module provides:
//! - Daily aggregation over a trailing window
//! - EWMA smoothing and least-squares trend
//! - Weekday/weekend seasonal split
//! - Weekly forecast composition
//! - Archetype clustering, pattern mining and anomaly rules
//! - A multi-factor confidence score
//! - A backtest of the forecast model
//!
//! Everything here is a pure function of a [`RecordSnapshot`], a reference
//! instant and an [`AnalysisConfig`]. Nothing returns an error: sparse or
//! empty input produces defined defaults.

pub mod aggregate;
pub mod anomaly;
pub mod cluster;
pub mod confidence;
pub mod evaluation;
pub mod forecast;
pub mod patterns;
pub mod seasonal;
pub mod smoothing;
pub mod trend;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use aggregate::{daily_totals, series_values, windowed_trips, DailyTotal};
pub use anomaly::detect_anomalies;
pub use cluster::assign_cluster;
pub use confidence::{confidence, ConfidenceBreakdown, ConfidenceInputs};
pub use evaluation::{
    aggregate, evaluate, evaluate_series, evaluate_users, AggregateEvaluation, Evaluation,
    EvaluationStatus, Metrics, UserEvaluation,
};
pub use forecast::{compose_forecast, risk_tier, Forecast};
pub use patterns::mine_patterns;
pub use seasonal::{seasonal, SeasonalResult};
pub use smoothing::smooth;
pub use trend::{trend, TrendDirection, TrendSummary};

use crate::config::AnalysisConfig;
use crate::model::{AnomalyFlag, PatternSummary, RecordSnapshot};

/// Name reported when the cluster catalog is empty.
pub const UNCLASSIFIED: &str = "Unclassified";

/// Behavior summary of one user, recomputed on every pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BehaviorProfile {
    /// Mean of the present daily travel totals, kg CO2e.
    pub avg_daily_travel: f64,
    /// Energy emission per day from the latest bill, kg CO2e.
    pub avg_daily_energy: f64,
    /// Trend of the daily series.
    pub trend: TrendSummary,
    /// Most frequent trip weekdays.
    pub peak_days: Vec<String>,
    /// Trips per vehicle label, first-seen order.
    pub vehicle_frequency: IndexMap<String, usize>,
}

/// Every intermediate and final result of one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Reference instant the window ends at.
    pub now: DateTime<Utc>,
    /// Trips inside the window.
    pub windowed_trip_count: usize,
    /// Present-day totals inside the window.
    pub daily: Vec<DailyTotal>,
    /// EWMA level of the daily series.
    pub smoothed: f64,
    /// Trend of the daily series.
    pub trend: TrendSummary,
    /// Weekday/weekend split.
    pub seasonal: SeasonalResult,
    /// Composed forecast.
    pub forecast: Forecast,
    /// Behavior profile.
    pub profile: BehaviorProfile,
    /// Assigned archetype name.
    pub cluster: String,
    /// Mined patterns.
    pub patterns: PatternSummary,
    /// Anomaly flags.
    pub anomalies: Vec<AnomalyFlag>,
    /// Confidence factors and score.
    pub confidence: ConfidenceBreakdown,
    /// Fractional days since the newest trip.
    pub days_since_last_trip: Option<f64>,
    /// Whether any bill exists.
    pub has_bills: bool,
}

impl Analysis {
    /// Short method/trend summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let trend = match self.trend.direction {
            TrendDirection::Increasing => format!(
                "daily emissions are rising by {:.2} kg/day",
                self.trend.slope
            ),
            TrendDirection::Decreasing => format!(
                "daily emissions are falling by {:.2} kg/day",
                self.trend.slope.abs()
            ),
            TrendDirection::Stable => "daily emissions are stable".to_string(),
        };

        format!(
            "{} forecast over {} active day(s); {}.",
            self.forecast.method,
            self.daily.len(),
            trend
        )
    }
}

/// Run the full analytics pipeline over a snapshot.
#[must_use]
pub fn analyze_snapshot(
    snapshot: &RecordSnapshot,
    now: DateTime<Utc>,
    config: &AnalysisConfig,
) -> Analysis {
    let windowed = windowed_trips(&snapshot.trips, now, config.window_days);
    let daily = daily_totals(&windowed);
    let series = series_values(&daily);

    let smoothed = smooth(&series, config.smoothing_alpha);
    let trend = trend(&series, config.trend_threshold);
    let seasonal = seasonal(&windowed, config.seasonal_threshold);
    debug!(
        windowed = windowed.len(),
        days = series.len(),
        smoothed,
        slope = trend.slope,
        seasonal = seasonal.has_pattern,
        "Aggregated daily series"
    );

    let forecast = compose_forecast(&series, &trend, &seasonal, snapshot.latest_bill(), config);
    let patterns = mine_patterns(&snapshot.trips, config);

    let avg_daily_travel = if series.is_empty() {
        0.0
    } else {
        series.iter().sum::<f64>() / series.len() as f64
    };

    let profile = BehaviorProfile {
        avg_daily_travel,
        avg_daily_energy: forecast.daily_energy,
        trend,
        peak_days: patterns.peak_days.clone(),
        vehicle_frequency: patterns
            .vehicle_usage
            .iter()
            .map(|usage| (usage.vehicle.clone(), usage.count))
            .collect(),
    };

    let cluster = assign_cluster(profile.avg_daily_travel, profile.avg_daily_energy, &config.clusters)
        .map_or_else(|| UNCLASSIFIED.to_string(), |archetype| archetype.name.clone());

    let anomalies = detect_anomalies(&profile, &patterns.distance_tiers, config);

    let days_since_last_trip = snapshot
        .trips
        .iter()
        .map(|trip| trip.timestamp)
        .max()
        .map(|latest| (now - latest).num_milliseconds() as f64 / 86_400_000.0);

    let has_bills = !snapshot.bills.is_empty();
    let confidence = confidence(
        &ConfidenceInputs {
            daily_series: &series,
            windowed_trips: windowed.len(),
            slope: trend.slope,
            seasonal_strength: seasonal.strength,
            days_since_last_trip,
            has_bills,
        },
        config,
    );

    debug!(
        cluster = %cluster,
        anomalies = anomalies.len(),
        confidence = confidence.score,
        "Analysis complete"
    );

    Analysis {
        now,
        windowed_trip_count: windowed.len(),
        daily,
        smoothed,
        trend,
        seasonal,
        forecast,
        profile,
        cluster,
        patterns,
        anomalies,
        confidence,
        days_since_last_trip,
        has_bills,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForecastMethod, RiskTier, TripRecord, UtilityBillRecord, Vehicle};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 20, 0, 0).unwrap()
    }

    fn steady_snapshot() -> RecordSnapshot {
        let trips = (0..10)
            .map(|i| TripRecord::new(now() - Duration::days(i), 10.0, 2.0, Vehicle::Car).unwrap())
            .collect();
        let bill = UtilityBillRecord::from_consumption(now() - Duration::days(3), "2025-03", 300.0, 0.45)
            .unwrap();
        RecordSnapshot::new(trips, vec![bill])
    }

    #[test]
    fn test_steady_user() {
        let analysis = analyze_snapshot(&steady_snapshot(), now(), &AnalysisConfig::default());

        assert_eq!(analysis.daily.len(), 10);
        assert_eq!(analysis.forecast.method, ForecastMethod::SmoothedTrend);
        assert!((analysis.forecast.total - 45.5).abs() < 1e-6);
        assert_eq!(analysis.forecast.risk_tier, RiskTier::High);
        assert_eq!(analysis.trend.direction, TrendDirection::Stable);
        assert!((analysis.profile.avg_daily_travel - 2.0).abs() < 1e-9);
        assert!((analysis.profile.avg_daily_energy - 4.5).abs() < 1e-9);
        assert!(analysis.anomalies.contains(&AnomalyFlag::EnergyDominates));
        assert_eq!(analysis.days_since_last_trip, Some(0.0));
        assert!(analysis.summary().starts_with("Smoothed + Trend forecast over 10 active day(s)"));
    }

    #[test]
    fn test_empty_snapshot() {
        let analysis = analyze_snapshot(&RecordSnapshot::default(), now(), &AnalysisConfig::default());

        assert_eq!(analysis.forecast.total, 0.0);
        assert_eq!(analysis.forecast.risk_tier, RiskTier::Low);
        assert_eq!(analysis.confidence.score, 5.0);
        assert_eq!(analysis.cluster, "Minimal Footprint");
        assert_eq!(analysis.anomalies, vec![AnomalyFlag::TravelDominates]);
        assert!(analysis.days_since_last_trip.is_none());
    }

    #[test]
    fn test_old_trips_only_feed_patterns() {
        let old = TripRecord::new(now() - Duration::days(90), 30.0, 6.0, Vehicle::Train).unwrap();
        let snapshot = RecordSnapshot::new(vec![old], Vec::new());

        let analysis = analyze_snapshot(&snapshot, now(), &AnalysisConfig::default());
        assert_eq!(analysis.windowed_trip_count, 0);
        assert!(analysis.daily.is_empty());
        assert_eq!(analysis.patterns.total_trips, 1);
        assert_eq!(analysis.patterns.most_used_vehicle.as_deref(), Some("Train"));
    }

    #[test]
    fn test_empty_catalog_is_unclassified() {
        let mut config = AnalysisConfig::default();
        config.clusters.clear();
        let analysis = analyze_snapshot(&steady_snapshot(), now(), &config);
        assert_eq!(analysis.cluster, UNCLASSIFIED);
    }
}
