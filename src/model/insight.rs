//! The assembled insight and the value types it is built from.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Projection labels, Monday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Coarse banding of the weekly forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RiskTier {
    /// Below the low threshold.
    Low,
    /// Between the low and moderate thresholds.
    Moderate,
    /// At or above the moderate threshold.
    High,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        })
    }
}

/// Method used for the travel part of the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Weekday/weekend averages scaled to a week.
    SeasonalDecomposition,
    /// EWMA level plus linear trend.
    SmoothedTrend,
}

impl ForecastMethod {
    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SeasonalDecomposition => "Seasonal Decomposition",
            Self::SmoothedTrend => "Smoothed + Trend",
        }
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of the daily emission trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Slope above the positive threshold.
    Increasing,
    /// Slope below the negative threshold.
    Decreasing,
    /// Anything in between, or too little data.
    #[default]
    Stable,
}

impl TrendDirection {
    /// Lowercase tag ("increasing", "decreasing", "stable").
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule-based anomaly tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyFlag {
    /// Energy dwarfs travel.
    EnergyDominates,
    /// Travel dwarfs energy.
    TravelDominates,
    /// Daily emissions are trending upward.
    EmissionsIncreasing,
    /// A weekend day is among the peak travel days.
    WeekendHeavyTravel,
    /// Long trips make up a large share of all trips.
    FrequentLongTrips,
}

impl AnomalyFlag {
    /// Stable snake_case tag.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::EnergyDominates => "energy_dominates",
            Self::TravelDominates => "travel_dominates",
            Self::EmissionsIncreasing => "emissions_increasing",
            Self::WeekendHeavyTravel => "weekend_heavy_travel",
            Self::FrequentLongTrips => "frequent_long_trips",
        }
    }
}

impl fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A named point in (travel, energy) kg/day space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterArchetype {
    /// Archetype name.
    pub name: String,
    /// Average daily travel emission, kg CO2e.
    pub travel: f64,
    /// Average daily energy emission, kg CO2e.
    pub energy: f64,
}

impl ClusterArchetype {
    /// Create an archetype.
    pub fn new(name: impl Into<String>, travel: f64, energy: f64) -> Self {
        Self {
            name: name.into(),
            travel,
            energy,
        }
    }
}

/// Travel/energy split of the weekly forecast.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EmissionBreakdown {
    /// Weekly travel forecast, kg CO2e.
    pub travel: f64,
    /// Weekly energy forecast, kg CO2e.
    pub energy: f64,
}

/// One entry of the 7-day projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DayProjection {
    /// Weekday label ("Mon".."Sun").
    pub day: String,
    /// Projected emission, kg CO2e.
    pub value: f64,
}

/// Trip count for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DayCount {
    /// Weekday label.
    pub day: String,
    /// Trips on that weekday.
    pub count: usize,
}

/// Usage of one vehicle label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VehicleUsage {
    /// Vehicle label.
    pub vehicle: String,
    /// Number of trips.
    pub count: usize,
    /// Share of all trips (0..1).
    pub share: f64,
}

/// Trip counts per distance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct DistanceTiers {
    /// Trips shorter than the short-trip limit.
    pub short: usize,
    /// Trips between the short and long limits.
    pub medium: usize,
    /// Trips at or above the long-trip limit.
    pub long: usize,
}

impl DistanceTiers {
    /// Total trips across tiers.
    #[must_use]
    pub fn total(&self) -> usize {
        self.short + self.medium + self.long
    }

    /// Share of long trips (0 when there are none).
    #[must_use]
    pub fn long_share(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.long as f64 / total as f64
        }
    }
}

/// Frequency patterns mined from the full trip history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PatternSummary {
    /// Most frequent weekdays, most frequent first.
    pub peak_days: Vec<String>,
    /// Trips per weekday in first-seen order.
    pub weekday_counts: Vec<DayCount>,
    /// Trips per vehicle label in first-seen order.
    pub vehicle_usage: Vec<VehicleUsage>,
    /// Most used vehicle label.
    pub most_used_vehicle: Option<String>,
    /// Distance tier counts.
    pub distance_tiers: DistanceTiers,
    /// Total number of trips.
    pub total_trips: usize,
    /// Total distance, km.
    pub total_distance_km: f64,
    /// Average trip distance, km.
    pub average_distance_km: f64,
}

/// Where the recommendation strings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// The external generator answered.
    External,
    /// The local templates filled in.
    Local,
}

/// Trend result carried in the insight.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrendSummary {
    /// Least-squares slope, kg/day per day.
    pub slope: f64,
    /// Classified direction.
    pub direction: TrendDirection,
}

/// The output of one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Insight {
    /// When the insight was produced.
    pub generated_at: DateTime<Utc>,
    /// Forecast total for the next 7 days, kg CO2e.
    pub weekly_forecast: f64,
    /// Reduction target for the same week, kg CO2e.
    pub optimized_forecast: f64,
    /// Risk tier of the weekly forecast.
    pub risk_tier: RiskTier,
    /// Travel/energy split.
    pub breakdown: EmissionBreakdown,
    /// Mon..Sun projection (always 7 entries).
    pub daily_projection: Vec<DayProjection>,
    /// Mined trip patterns.
    pub patterns: PatternSummary,
    /// Anomaly tags.
    pub anomalies: Vec<AnomalyFlag>,
    /// Confidence percentage.
    pub confidence: f64,
    /// Forecast method used.
    pub method: ForecastMethod,
    /// Behavioral archetype name.
    pub cluster: String,
    /// Trend of the daily series.
    pub trend: TrendSummary,
    /// Average daily travel emission, kg CO2e.
    pub avg_daily_travel: f64,
    /// Average daily energy emission, kg CO2e.
    pub avg_daily_energy: f64,
    /// Short method/trend summary.
    pub summary: String,
    /// Up to three recommendations.
    pub recommendations: Vec<String>,
    /// Origin of the recommendations.
    pub recommendation_source: RecommendationSource,
}
