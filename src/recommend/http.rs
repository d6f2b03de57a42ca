//! Recommendation generator backed by an HTTP endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{RecommendationContext, RecommendationGenerator};
use crate::error::{FootprintError, Result};

#[derive(Debug, Deserialize)]
struct RecommendationResponse {
    recommendations: Vec<String>,
}

/// POSTs the context as JSON and reads `{"recommendations": [...]}`.
#[derive(Debug, Clone)]
pub struct HttpRecommendationGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecommendationGenerator {
    /// Create a generator for `endpoint` with a request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FootprintError::generator(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RecommendationGenerator for HttpRecommendationGenerator {
    #[instrument(skip(self, context), fields(endpoint = %self.endpoint))]
    async fn generate(&self, context: &RecommendationContext) -> Result<Vec<String>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(context)
            .send()
            .await?
            .error_for_status()?;

        let body: RecommendationResponse = response.json().await?;
        debug!(count = body.recommendations.len(), "Received recommendations");
        Ok(body.recommendations)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrendDirection;

    #[test]
    fn test_response_shape() {
        let body: RecommendationResponse =
            serde_json::from_str(r#"{"recommendations": ["a", "b", "c"]}"#).unwrap();
        assert_eq!(body.recommendations.len(), 3);

        assert!(serde_json::from_str::<RecommendationResponse>(r#"{"tips": []}"#).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_errors() {
        // Port 9 (discard) on localhost is not expected to speak HTTP
        let generator =
            HttpRecommendationGenerator::new("http://127.0.0.1:9/recommend", Duration::from_millis(200))
                .unwrap();
        let context = RecommendationContext {
            cluster: "Eco Commuter".to_string(),
            avg_daily_travel: 1.0,
            avg_daily_energy: 2.0,
            regional_daily_average: 12.0,
            trend_direction: TrendDirection::Stable,
            trend_slope: 0.0,
            peak_days: Vec::new(),
            most_used_vehicle: None,
            anomalies: Vec::new(),
            weekly_forecast: 21.0,
            optimized_forecast: 16.8,
            trip_count: 4,
        };

        let err = generator.generate(&context).await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
