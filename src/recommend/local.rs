//! Deterministic template recommendations.

use async_trait::async_trait;

use super::{RecommendationContext, RecommendationGenerator};
use crate::error::Result;
use crate::model::{AnomalyFlag, TrendDirection};

/// Fills three recommendations from fixed templates.
///
/// Every number in the output comes straight from the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTemplateGenerator;

impl LocalTemplateGenerator {
    /// Create a generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render the three recommendations.
    #[must_use]
    pub fn render(&self, context: &RecommendationContext) -> Vec<String> {
        vec![
            dominant_source(context),
            behavior(context),
            target(context),
        ]
    }
}

#[async_trait]
impl RecommendationGenerator for LocalTemplateGenerator {
    async fn generate(&self, context: &RecommendationContext) -> Result<Vec<String>> {
        Ok(self.render(context))
    }

    fn name(&self) -> &str {
        "local"
    }
}

fn dominant_source(context: &RecommendationContext) -> String {
    let energy_heavy = context.has_anomaly(AnomalyFlag::EnergyDominates.tag())
        || context.avg_daily_energy > context.avg_daily_travel;

    if context.trip_count == 0 && context.avg_daily_energy == 0.0 {
        return "Log a few trips and your latest utility bill so your footprint can be estimated."
            .to_string();
    }

    if energy_heavy {
        let comparison = if context.avg_daily_energy > context.regional_daily_average {
            "above"
        } else {
            "within"
        };
        format!(
            "Home energy averages {:.1} kg CO2e/day, {} the regional reference of {:.1} kg. \
             Trimming standby load and shifting heavy appliances off-peak is your biggest lever.",
            context.avg_daily_energy, comparison, context.regional_daily_average
        )
    } else {
        let vehicle = context.most_used_vehicle.as_deref().unwrap_or("your usual vehicle");
        format!(
            "Travel averages {:.1} kg CO2e/day and most trips use {}. \
             Swapping a couple of those trips for transit, cycling or walking each week cuts that directly.",
            context.avg_daily_travel, vehicle
        )
    }
}

fn behavior(context: &RecommendationContext) -> String {
    if context.trend_direction == TrendDirection::Increasing {
        return format!(
            "Daily emissions are rising by {:.2} kg per day. Look back over the last week for new or longer trips.",
            context.trend_slope
        );
    }
    if context.has_anomaly(AnomalyFlag::FrequentLongTrips.tag()) {
        return "Long trips make up a large share of your travel. Combining them or taking the train \
                for the longest ones has the most effect."
            .to_string();
    }
    if context.has_anomaly(AnomalyFlag::WeekendHeavyTravel.tag()) {
        return format!(
            "Your busiest travel days are {}. Grouping weekend errands into a single outing saves repeat trips.",
            context.peak_days.join(" and ")
        );
    }

    match context.trend_direction {
        TrendDirection::Decreasing => format!(
            "Daily emissions are falling by {:.2} kg per day. Keep the habits that got you here.",
            context.trend_slope.abs()
        ),
        _ => format!(
            "Your emissions are steady and you match the {} profile. Keep logging trips so the forecast stays accurate.",
            context.cluster
        ),
    }
}

fn target(context: &RecommendationContext) -> String {
    format!(
        "Aim for {:.1} kg CO2e next week instead of the forecast {:.1} kg, a saving of {:.1} kg.",
        context.optimized_forecast,
        context.weekly_forecast,
        context.weekly_forecast - context.optimized_forecast
    )
}
