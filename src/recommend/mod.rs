//! Recommendation generation.
//!
//! Recommendations are produced by a [`RecommendationGenerator`], which
//! only ever sees a read-only [`RecommendationContext`] built from an
//! already-computed analysis. The local template generator is always
//! available; an HTTP generator can be configured in front of it, and
//! [`FallbackGenerator`] makes sure a failure in the external one never
//! leaves the insight without recommendations.

mod http;
mod local;

pub use http::HttpRecommendationGenerator;
pub use local::LocalTemplateGenerator;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analytics::Analysis;
use crate::config::AnalysisConfig;
use crate::error::{FootprintError, Result};
use crate::model::{RecommendationSource, TrendDirection};

/// Number of recommendations every generator must return.
pub const RECOMMENDATION_COUNT: usize = 3;

/// Read-only metrics handed to a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationContext {
    /// Assigned archetype name.
    pub cluster: String,
    /// Average daily travel emission, kg CO2e.
    pub avg_daily_travel: f64,
    /// Average daily energy emission, kg CO2e.
    pub avg_daily_energy: f64,
    /// Regional reference, kg CO2e per day.
    pub regional_daily_average: f64,
    /// Trend direction of the daily series.
    pub trend_direction: TrendDirection,
    /// Trend slope, kg/day per day.
    pub trend_slope: f64,
    /// Peak travel weekdays.
    pub peak_days: Vec<String>,
    /// Most used vehicle label.
    pub most_used_vehicle: Option<String>,
    /// Anomaly tags.
    pub anomalies: Vec<String>,
    /// Weekly forecast, kg CO2e.
    pub weekly_forecast: f64,
    /// Optimized weekly target, kg CO2e.
    pub optimized_forecast: f64,
    /// Total logged trips.
    pub trip_count: usize,
}

impl RecommendationContext {
    /// Build the context from a finished analysis.
    #[must_use]
    pub fn from_analysis(analysis: &Analysis, config: &AnalysisConfig) -> Self {
        Self {
            cluster: analysis.cluster.clone(),
            avg_daily_travel: analysis.profile.avg_daily_travel,
            avg_daily_energy: analysis.profile.avg_daily_energy,
            regional_daily_average: config.regional_daily_average,
            trend_direction: analysis.trend.direction,
            trend_slope: analysis.trend.slope,
            peak_days: analysis.profile.peak_days.clone(),
            most_used_vehicle: analysis.patterns.most_used_vehicle.clone(),
            anomalies: analysis.anomalies.iter().map(|flag| flag.tag().to_string()).collect(),
            weekly_forecast: analysis.forecast.total,
            optimized_forecast: analysis.forecast.optimized,
            trip_count: analysis.patterns.total_trips,
        }
    }

    /// Whether an anomaly tag is present.
    #[must_use]
    pub fn has_anomaly(&self, tag: &str) -> bool {
        self.anomalies.iter().any(|a| a == tag)
    }
}

/// A source of recommendation text.
#[async_trait]
pub trait RecommendationGenerator: Send + Sync {
    /// Produce exactly three recommendations for the context.
    async fn generate(&self, context: &RecommendationContext) -> Result<Vec<String>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Check a generator response: exactly three non-empty strings.
pub fn validate_recommendations(recommendations: Vec<String>) -> Result<Vec<String>> {
    let cleaned: Vec<String> = recommendations
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();

    if cleaned.len() == RECOMMENDATION_COUNT {
        Ok(cleaned)
    } else {
        Err(FootprintError::MalformedRecommendations {
            count: cleaned.len(),
        })
    }
}

/// Wraps a generator with a timeout and the local templates.
pub struct FallbackGenerator {
    primary: Option<Arc<dyn RecommendationGenerator>>,
    fallback: LocalTemplateGenerator,
    timeout: Duration,
}

impl FallbackGenerator {
    /// Try `primary` first, bounded by `timeout`.
    #[must_use]
    pub fn new(primary: Arc<dyn RecommendationGenerator>, timeout: Duration) -> Self {
        Self {
            primary: Some(primary),
            fallback: LocalTemplateGenerator::new(),
            timeout,
        }
    }

    /// Only ever use the local templates.
    #[must_use]
    pub fn local_only() -> Self {
        Self {
            primary: None,
            fallback: LocalTemplateGenerator::new(),
            timeout: Duration::ZERO,
        }
    }

    /// Produce recommendations; never fails.
    pub async fn recommend(&self, context: &RecommendationContext) -> (Vec<String>, RecommendationSource) {
        if let Some(primary) = &self.primary {
            match self.try_primary(primary.as_ref(), context).await {
                Ok(recommendations) => {
                    debug!(generator = primary.name(), "Using external recommendations");
                    return (recommendations, RecommendationSource::External);
                }
                Err(e) => {
                    warn!(
                        generator = primary.name(),
                        error = %e,
                        "Recommendation generator failed; using local templates"
                    );
                }
            }
        }

        (self.fallback.render(context), RecommendationSource::Local)
    }

    async fn try_primary(
        &self,
        primary: &dyn RecommendationGenerator,
        context: &RecommendationContext,
    ) -> Result<Vec<String>> {
        let response = tokio::time::timeout(self.timeout, primary.generate(context))
            .await
            .map_err(|_| FootprintError::Timeout {
                duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        validate_recommendations(response)
    }
}
