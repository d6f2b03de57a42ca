//! Weekly forecast composition.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::seasonal::SeasonalResult;
use super::smoothing::smooth;
use crate::config::AnalysisConfig;
use crate::model::{
    DayProjection, EmissionBreakdown, ForecastMethod, RiskTier, TrendSummary, UtilityBillRecord,
    WEEKDAY_LABELS,
};

const DAYS_PER_WEEK: f64 = 7.0;
const WEEKDAYS: f64 = 5.0;
const WEEKEND_DAYS: f64 = 2.0;

/// The composed 7-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Energy emission per day from the latest bill, kg CO2e.
    pub daily_energy: f64,
    /// Travel/energy split of the weekly total.
    pub breakdown: EmissionBreakdown,
    /// Weekly total, kg CO2e.
    pub total: f64,
    /// Reduction target, kg CO2e.
    pub optimized: f64,
    /// Risk tier of the total.
    pub risk_tier: RiskTier,
    /// Travel method used.
    pub method: ForecastMethod,
    /// Mon..Sun projection.
    pub daily_projection: Vec<DayProjection>,
}

/// Energy emission per day derived from a bill.
#[must_use]
pub fn daily_energy(latest_bill: Option<&UtilityBillRecord>, config: &AnalysisConfig) -> f64 {
    latest_bill.map_or(0.0, |bill| {
        bill.units_kwh * config.grid_intensity / config.billing_days
    })
}

/// Band a weekly total into a risk tier.
#[must_use]
pub fn risk_tier(total: f64, config: &AnalysisConfig) -> RiskTier {
    if total < config.risk_low_max {
        RiskTier::Low
    } else if total < config.risk_moderate_max {
        RiskTier::Moderate
    } else {
        RiskTier::High
    }
}

/// Compose the weekly forecast from the per-stage results.
///
/// The seasonal method is used only when a pattern exists and the daily
/// series has more than `seasonal_min_days` entries; otherwise the travel
/// forecast is the smoothed level plus a week of trend, times seven.
#[must_use]
pub fn compose_forecast(
    daily_series: &[f64],
    trend: &TrendSummary,
    seasonal: &SeasonalResult,
    latest_bill: Option<&UtilityBillRecord>,
    config: &AnalysisConfig,
) -> Forecast {
    let daily_energy = daily_energy(latest_bill, config);

    let use_seasonal = seasonal.has_pattern && daily_series.len() > config.seasonal_min_days;
    let (method, travel) = if use_seasonal {
        (
            ForecastMethod::SeasonalDecomposition,
            seasonal.weekday_avg * WEEKDAYS + seasonal.weekend_avg * WEEKEND_DAYS,
        )
    } else {
        let level = smooth(daily_series, config.smoothing_alpha);
        (
            ForecastMethod::SmoothedTrend,
            (level + trend.slope * DAYS_PER_WEEK) * DAYS_PER_WEEK,
        )
    };
    // A steep downward trend must not forecast negative emissions
    let travel = travel.max(0.0);

    let energy = daily_energy * DAYS_PER_WEEK;
    let total = travel + energy;

    let daily_projection = WEEKDAY_LABELS
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let value = if use_seasonal {
                let base = if index >= 5 {
                    seasonal.weekend_avg
                } else {
                    seasonal.weekday_avg
                };
                base + daily_energy
            } else {
                total / DAYS_PER_WEEK
            };
            DayProjection {
                day: (*label).to_string(),
                value,
            }
        })
        .collect();

    debug!(
        method = %method,
        travel,
        energy,
        total,
        "Composed weekly forecast"
    );

    Forecast {
        daily_energy,
        breakdown: EmissionBreakdown { travel, energy },
        total,
        optimized: total * config.reduction_factor,
        risk_tier: risk_tier(total, config),
        method,
        daily_projection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrendDirection;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn bill(units: f64) -> UtilityBillRecord {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        UtilityBillRecord::from_consumption(ts, "2025-02", units, 0.45).unwrap()
    }

    #[test]
    fn test_smoothed_trend_with_bill() {
        let config = AnalysisConfig::default();
        let series = vec![2.0; 10];
        let bill = bill(300.0);

        let forecast = compose_forecast(
            &series,
            &TrendSummary::default(),
            &SeasonalResult::default(),
            Some(&bill),
            &config,
        );

        assert!((forecast.daily_energy - 4.5).abs() < 1e-9);
        assert!((forecast.breakdown.travel - 14.0).abs() < 1e-9);
        assert!((forecast.breakdown.energy - 31.5).abs() < 1e-9);
        assert!((forecast.total - 45.5).abs() < 1e-9);
        assert!((forecast.optimized - 36.4).abs() < 1e-9);
        assert_eq!(forecast.risk_tier, RiskTier::High);
        assert_eq!(forecast.method, ForecastMethod::SmoothedTrend);
        for entry in &forecast.daily_projection {
            assert!((entry.value - 6.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trend_is_added_per_day() {
        let config = AnalysisConfig::default();
        let trend = TrendSummary {
            slope: 0.5,
            direction: TrendDirection::Increasing,
        };

        let forecast = compose_forecast(&[1.0], &trend, &SeasonalResult::default(), None, &config);
        // (1 + 0.5 * 7) * 7
        assert!((forecast.total - 31.5).abs() < 1e-9);
    }

    #[test]
    fn test_negative_travel_is_clamped() {
        let config = AnalysisConfig::default();
        let trend = TrendSummary {
            slope: -2.0,
            direction: TrendDirection::Decreasing,
        };

        let forecast = compose_forecast(&[5.0, 3.0, 1.0], &trend, &SeasonalResult::default(), None, &config);
        assert_eq!(forecast.breakdown.travel, 0.0);
        assert_eq!(forecast.risk_tier, RiskTier::Low);
    }

    #[test]
    fn test_seasonal_method_needs_more_than_a_week() {
        let config = AnalysisConfig::default();
        let seasonal = SeasonalResult {
            weekday_avg: 3.0,
            weekend_avg: 1.0,
            strength: 2.0 / 3.0,
            has_pattern: true,
        };

        let short = compose_forecast(&[3.0; 7], &TrendSummary::default(), &seasonal, None, &config);
        assert_eq!(short.method, ForecastMethod::SmoothedTrend);

        let long = compose_forecast(&[3.0; 8], &TrendSummary::default(), &seasonal, None, &config);
        assert_eq!(long.method, ForecastMethod::SeasonalDecomposition);
        assert!((long.total - 17.0).abs() < 1e-9);

        let labels: Vec<&str> = long.daily_projection.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(labels, WEEKDAY_LABELS);
        assert_eq!(long.daily_projection[0].value, 3.0);
        assert_eq!(long.daily_projection[5].value, 1.0);
        assert_eq!(long.daily_projection[6].value, 1.0);
    }

    #[test]
    fn test_empty_inputs_forecast_zero() {
        let config = AnalysisConfig::default();
        let forecast = compose_forecast(&[], &TrendSummary::default(), &SeasonalResult::default(), None, &config);
        assert_eq!(forecast.total, 0.0);
        assert_eq!(forecast.optimized, 0.0);
        assert_eq!(forecast.risk_tier, RiskTier::Low);
        assert_eq!(forecast.daily_projection.len(), 7);
    }

    #[rstest]
    #[case(0.0, RiskTier::Low)]
    #[case(14.99, RiskTier::Low)]
    #[case(15.0, RiskTier::Moderate)]
    #[case(29.99, RiskTier::Moderate)]
    #[case(30.0, RiskTier::High)]
    fn test_risk_tier_boundaries(#[case] total: f64, #[case] expected: RiskTier) {
        assert_eq!(risk_tier(total, &AnalysisConfig::default()), expected);
    }
}
