//! Rule-based anomaly flags.

use super::BehaviorProfile;
use crate::config::AnalysisConfig;
use crate::model::{AnomalyFlag, DistanceTiers, TrendDirection};

const WEEKEND_LABELS: [&str; 2] = ["Sat", "Sun"];

/// Apply every anomaly rule; flags may co-occur.
///
/// The travel average is floored at `min_travel_denominator`, so a profile
/// with no travel and no energy has ratio 0 and reads as travel-dominated.
#[must_use]
pub fn detect_anomalies(
    profile: &BehaviorProfile,
    tiers: &DistanceTiers,
    config: &AnalysisConfig,
) -> Vec<AnomalyFlag> {
    let mut flags = Vec::new();

    let ratio = profile.avg_daily_energy / profile.avg_daily_travel.max(config.min_travel_denominator);
    if ratio > config.energy_dominance_ratio {
        flags.push(AnomalyFlag::EnergyDominates);
    } else if ratio < config.travel_dominance_ratio {
        flags.push(AnomalyFlag::TravelDominates);
    }

    if profile.trend.direction == TrendDirection::Increasing {
        flags.push(AnomalyFlag::EmissionsIncreasing);
    }

    if profile
        .peak_days
        .iter()
        .any(|day| WEEKEND_LABELS.contains(&day.as_str()))
    {
        flags.push(AnomalyFlag::WeekendHeavyTravel);
    }

    if tiers.long_share() > config.long_trip_share {
        flags.push(AnomalyFlag::FrequentLongTrips);
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrendSummary;

    fn profile(travel: f64, energy: f64) -> BehaviorProfile {
        BehaviorProfile {
            avg_daily_travel: travel,
            avg_daily_energy: energy,
            ..BehaviorProfile::default()
        }
    }

    #[test]
    fn test_energy_dominates() {
        let flags = detect_anomalies(&profile(2.0, 10.0), &DistanceTiers::default(), &AnalysisConfig::default());
        assert!(flags.contains(&AnomalyFlag::EnergyDominates));
        assert!(!flags.contains(&AnomalyFlag::TravelDominates));
    }

    #[test]
    fn test_travel_dominates() {
        let flags = detect_anomalies(&profile(10.0, 2.0), &DistanceTiers::default(), &AnalysisConfig::default());
        assert_eq!(flags, vec![AnomalyFlag::TravelDominates]);
    }

    #[test]
    fn test_zero_travel_uses_denominator_floor() {
        // 0.5 / 0.1 = 5
        let flags = detect_anomalies(&profile(0.0, 0.5), &DistanceTiers::default(), &AnalysisConfig::default());
        assert_eq!(flags, vec![AnomalyFlag::EnergyDominates]);
    }

    #[test]
    fn test_no_data_reads_as_travel_dominated() {
        // 0 / max(0, 0.1) = 0
        let flags = detect_anomalies(&profile(0.0, 0.0), &DistanceTiers::default(), &AnalysisConfig::default());
        assert_eq!(flags, vec![AnomalyFlag::TravelDominates]);
    }

    #[test]
    fn test_flags_co_occur() {
        let mut profile = profile(3.0, 3.0);
        profile.trend = TrendSummary {
            slope: 0.4,
            direction: TrendDirection::Increasing,
        };
        profile.peak_days = vec!["Fri".to_string(), "Sun".to_string()];
        let tiers = DistanceTiers {
            short: 1,
            medium: 1,
            long: 2,
        };

        let flags = detect_anomalies(&profile, &tiers, &AnalysisConfig::default());
        assert_eq!(
            flags,
            vec![
                AnomalyFlag::EmissionsIncreasing,
                AnomalyFlag::WeekendHeavyTravel,
                AnomalyFlag::FrequentLongTrips,
            ]
        );
    }

    #[test]
    fn test_long_trip_share_is_strict() {
        let tiers = DistanceTiers {
            short: 7,
            medium: 0,
            long: 3,
        };
        let flags = detect_anomalies(&profile(3.0, 3.0), &tiers, &AnalysisConfig::default());
        assert!(!flags.contains(&AnomalyFlag::FrequentLongTrips));
    }
}
