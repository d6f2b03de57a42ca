//! Insight assembly.
//!
//! [`InsightEngine`] runs the analytics core over a captured snapshot and
//! packages the results, asking a recommendation generator for the text.
//! Each call works on its own snapshot, so concurrent calls for the same
//! user never see each other's state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::analytics::{analyze_snapshot, Analysis};
use crate::config::Config;
use crate::error::Result;
use crate::model::{Insight, RecommendationSource, RecordSnapshot};
use crate::recommend::{
    FallbackGenerator, HttpRecommendationGenerator, LocalTemplateGenerator, RecommendationContext,
    RecommendationGenerator,
};

/// Produces insights from record snapshots.
pub struct InsightEngine {
    config: Config,
    generator: FallbackGenerator,
}

impl InsightEngine {
    /// Create an engine that asks `generator` first.
    #[must_use]
    pub fn new(config: Config, generator: Arc<dyn RecommendationGenerator>) -> Self {
        let timeout = Duration::from_millis(config.recommendations.timeout_ms);
        Self {
            config,
            generator: FallbackGenerator::new(generator, timeout),
        }
    }

    /// Create an engine that only uses the local templates.
    #[must_use]
    pub fn local(config: Config) -> Self {
        Self {
            config,
            generator: FallbackGenerator::local_only(),
        }
    }

    /// Create an engine wired from the `[recommendations]` settings.
    ///
    /// Uses the HTTP generator when enabled and an endpoint is set, and the
    /// local templates otherwise.
    pub fn from_config(config: Config) -> Result<Self> {
        let settings = &config.recommendations;
        match (&settings.endpoint, settings.enabled) {
            (Some(endpoint), true) => {
                let timeout = Duration::from_millis(settings.timeout_ms);
                let generator = HttpRecommendationGenerator::new(endpoint.clone(), timeout)?;
                Ok(Self::new(config, Arc::new(generator)))
            }
            _ => Ok(Self::local(config)),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the analytics pipeline synchronously.
    #[must_use]
    pub fn compute(&self, snapshot: &RecordSnapshot, now: DateTime<Utc>) -> Analysis {
        analyze_snapshot(snapshot, now, &self.config.analysis)
    }

    /// Build a complete insight; never fails.
    #[instrument(skip(self, snapshot), fields(trips = snapshot.trips.len(), bills = snapshot.bills.len()))]
    pub async fn generate(&self, snapshot: &RecordSnapshot, now: DateTime<Utc>) -> Insight {
        let analysis = self.compute(snapshot, now);
        let context = RecommendationContext::from_analysis(&analysis, &self.config.analysis);
        let (recommendations, source) = self.generator.recommend(&context).await;

        info!(
            forecast = analysis.forecast.total,
            cluster = %analysis.cluster,
            confidence = analysis.confidence.score,
            "Insight generated"
        );
        assemble(analysis, now, recommendations, source)
    }

    /// Build an insight with local recommendations only, without awaiting.
    #[must_use]
    pub fn generate_local(&self, snapshot: &RecordSnapshot, now: DateTime<Utc>) -> Insight {
        let analysis = self.compute(snapshot, now);
        let context = RecommendationContext::from_analysis(&analysis, &self.config.analysis);
        let recommendations = LocalTemplateGenerator::new().render(&context);
        assemble(analysis, now, recommendations, RecommendationSource::Local)
    }
}

/// Package an analysis and its recommendations into an [`Insight`].
#[must_use]
pub fn assemble(
    analysis: Analysis,
    generated_at: DateTime<Utc>,
    recommendations: Vec<String>,
    recommendation_source: RecommendationSource,
) -> Insight {
    let summary = analysis.summary();
    Insight {
        generated_at,
        weekly_forecast: analysis.forecast.total,
        optimized_forecast: analysis.forecast.optimized,
        risk_tier: analysis.forecast.risk_tier,
        breakdown: analysis.forecast.breakdown,
        daily_projection: analysis.forecast.daily_projection,
        patterns: analysis.patterns,
        anomalies: analysis.anomalies,
        confidence: analysis.confidence.score,
        method: analysis.forecast.method,
        cluster: analysis.cluster,
        trend: analysis.trend,
        avg_daily_travel: analysis.profile.avg_daily_travel,
        avg_daily_energy: analysis.profile.avg_daily_energy,
        summary,
        recommendations,
        recommendation_source,
    }
}
