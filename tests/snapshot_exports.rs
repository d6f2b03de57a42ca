//! Snapshot tests for export formats using insta.
//!
//! These tests verify that export output remains consistent across changes.
//! Run `cargo insta review` to update snapshots after intentional changes.

use chrono::{TimeZone, Utc};
use footprint_insight::export::{
    CsvExporter, CsvMode, ExportFormat, ExportOptions, Exporter, MarkdownExporter, TextExporter,
};
use footprint_insight::model::{
    AnomalyFlag, DayCount, DayProjection, DistanceTiers, EmissionBreakdown, ForecastMethod,
    Insight, PatternSummary, RecommendationSource, RiskTier, TrendDirection, TrendSummary,
    VehicleUsage, WEEKDAY_LABELS,
};
use insta::{assert_json_snapshot, assert_snapshot};

/// A hand-built insight so every number in the snapshots is known.
fn sample_insight() -> Insight {
    let projection = [6.0, 6.0, 6.0, 6.0, 6.0, 8.5, 8.5];
    Insight {
        generated_at: Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap(),
        weekly_forecast: 45.5,
        optimized_forecast: 36.4,
        risk_tier: RiskTier::High,
        breakdown: EmissionBreakdown {
            travel: 14.0,
            energy: 31.5,
        },
        daily_projection: WEEKDAY_LABELS
            .iter()
            .zip(projection)
            .map(|(day, value)| DayProjection {
                day: (*day).to_string(),
                value,
            })
            .collect(),
        patterns: PatternSummary {
            peak_days: vec!["Mon".to_string(), "Sat".to_string()],
            weekday_counts: vec![
                DayCount {
                    day: "Mon".to_string(),
                    count: 4,
                },
                DayCount {
                    day: "Sat".to_string(),
                    count: 3,
                },
                DayCount {
                    day: "Wed".to_string(),
                    count: 1,
                },
            ],
            vehicle_usage: vec![
                VehicleUsage {
                    vehicle: "Car".to_string(),
                    count: 6,
                    share: 0.75,
                },
                VehicleUsage {
                    vehicle: "Bike".to_string(),
                    count: 2,
                    share: 0.25,
                },
            ],
            most_used_vehicle: Some("Car".to_string()),
            distance_tiers: DistanceTiers {
                short: 3,
                medium: 4,
                long: 1,
            },
            total_trips: 8,
            total_distance_km: 80.0,
            average_distance_km: 10.0,
        },
        anomalies: vec![AnomalyFlag::EnergyDominates, AnomalyFlag::WeekendHeavyTravel],
        confidence: 62.0,
        method: ForecastMethod::SmoothedTrend,
        cluster: "Energy-Heavy Home".to_string(),
        trend: TrendSummary {
            slope: 0.0,
            direction: TrendDirection::Stable,
        },
        avg_daily_travel: 2.0,
        avg_daily_energy: 4.5,
        summary: "Smoothed + Trend forecast over 8 active day(s); daily emissions are stable."
            .to_string(),
        recommendations: vec![
            "First tip.".to_string(),
            "Second tip.".to_string(),
            "Third tip.".to_string(),
        ],
        recommendation_source: RecommendationSource::Local,
    }
}

/// Export the sample insight to string using the given exporter.
fn render<E: Exporter>(exporter: &E) -> String {
    let mut buffer = Vec::new();
    exporter
        .export_insight(&sample_insight(), &mut buffer, &ExportOptions::default())
        .expect("Export failed");
    String::from_utf8(buffer).expect("Invalid UTF-8 in export output")
}

mod csv_snapshots {
    use super::*;

    #[test]
    fn test_projection_csv() {
        assert_snapshot!(render(&CsvExporter::new()), @r"
        day,projected_kg
        Mon,6.00
        Tue,6.00
        Wed,6.00
        Thu,6.00
        Fri,6.00
        Sat,8.50
        Sun,8.50
        ");
    }

    #[test]
    fn test_vehicle_csv() {
        assert_snapshot!(render(&CsvExporter::new().with_mode(CsvMode::Vehicles)), @r"
        vehicle,trips,share
        Car,6,0.750
        Bike,2,0.250
        ");
    }
}

mod text_snapshots {
    use super::*;

    #[test]
    fn test_text_report() {
        assert_snapshot!(render(&TextExporter::new()), @r"
        Footprint insight (2025-03-31 12:00:00 UTC)
        Smoothed + Trend forecast over 8 active day(s); daily emissions are stable.
        ------------------------------------------------------------
        Weekly forecast:  45.5 kg (High risk)
        Optimized target: 36.4 kg
        Breakdown:        travel 14.0 kg, energy 31.5 kg
        Method:           Smoothed + Trend
        Confidence:       62%
        Cluster:          Energy-Heavy Home
        Trend:            stable (+0.00 kg/day)
        Next 7 days:      ▁▁▁▁▁██ (Mon Tue Wed Thu Fri Sat Sun)
        ------------------------------------------------------------
        Trips: 8 over 80.0 km
        Peak days: Mon, Sat
        Most used vehicle: Car
        ------------------------------------------------------------
        Anomalies: energy_dominates, weekend_heavy_travel
        ------------------------------------------------------------
        Recommendations:
          * First tip.
          * Second tip.
          * Third tip.
        ");
    }
}

mod markdown_snapshots {
    use super::*;

    #[test]
    fn test_markdown_report() {
        assert_snapshot!(render(&MarkdownExporter::new()), @r"
        # Weekly Footprint Insight

        _Generated 2025-03-31 12:00:00 UTC_

        > Smoothed + Trend forecast over 8 active day(s); daily emissions are stable.

        ## Forecast

        | Metric | Value |
        |--------|-------|
        | Weekly forecast | 45.5 kg |
        | Optimized target | 36.4 kg |
        | Travel | 14.0 kg |
        | Energy | 31.5 kg |
        | Risk tier | High |
        | Method | Smoothed + Trend |
        | Confidence | 62% |
        | Cluster | Energy-Heavy Home |
        | Trend | stable (+0.00 kg/day) |

        ### Daily projection

        | Day | kg CO2e |
        |-----|---------|
        | Mon | 6.0 |
        | Tue | 6.0 |
        | Wed | 6.0 |
        | Thu | 6.0 |
        | Fri | 6.0 |
        | Sat | 8.5 |
        | Sun | 8.5 |

        ## Patterns

        - **Trips:** 8 (80.0 km total, 10.0 km average)
        - **Peak days:** Mon, Sat
        - **Most used vehicle:** Car
        - **Distance tiers:** 3 short, 4 medium, 1 long

        | Vehicle | Trips | Share |
        |---------|-------|-------|
        | Car | 6 | 75% |
        | Bike | 2 | 25% |

        ## Anomalies

        - `energy_dominates`
        - `weekend_heavy_travel`

        ## Recommendations

        1. First tip.
        2. Second tip.
        3. Third tip.
        ");
    }
}

mod json_snapshots {
    use super::*;

    #[test]
    fn test_breakdown_json() {
        assert_json_snapshot!(sample_insight().breakdown, @r#"
        {
          "travel": 14.0,
          "energy": 31.5
        }
        "#);
    }

    #[test]
    fn test_tags_json() {
        let insight = sample_insight();
        assert_json_snapshot!(
            (insight.method, insight.risk_tier, insight.anomalies, insight.recommendation_source),
            @r#"
        [
          "smoothed_trend",
          "High",
          [
            "energy_dominates",
            "weekend_heavy_travel"
          ],
          "local"
        ]
        "#
        );
    }

    #[test]
    fn test_export_format_extensions() {
        let extensions: Vec<&str> = [
            ExportFormat::Text,
            ExportFormat::Markdown,
            ExportFormat::Json,
            ExportFormat::Csv,
        ]
        .iter()
        .map(ExportFormat::extension)
        .collect();
        assert_eq!(extensions, vec!["txt", "md", "json", "csv"]);
    }
}
