//! Backtest of the smoothed-trend travel model against held-out days.
//!
//! The daily series of a user's whole history (present days only,
//! first-seen order) is split into a leading training part and a trailing
//! test part. Each test day is predicted from the training part alone and
//! compared with a baseline that always predicts the training mean. The
//! training part is also scored in-sample with one-step-ahead fits.
//!
//! [`evaluate_users`] runs the backtest for many users and [`aggregate`]
//! summarizes the held-out metrics across them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::aggregate::{daily_totals, series_values};
use super::smoothing::smooth;
use super::trend::least_squares_slope;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::model::TripRecord;

/// Fewest daily points a backtest is run on.
pub const MIN_EVALUATION_POINTS: usize = 14;

/// Share of the series used for training.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Outcome status of a backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    /// Metrics were computed.
    Success,
    /// Too few daily points.
    InsufficientData,
}

/// Regression accuracy metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Coefficient of determination.
    pub r2: f64,
    /// Mean absolute percentage error over non-zero actuals, in percent.
    pub mape: f64,
    /// Share of predictions within 2 kg, in percent.
    pub within_2kg: f64,
    /// Share of predictions within 5 kg, in percent.
    pub within_5kg: f64,
}

/// Result of a backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Whether metrics are available.
    pub status: EvaluationStatus,
    /// Daily points available.
    pub total_days: usize,
    /// Points used for training.
    pub train_days: usize,
    /// Points held out.
    pub test_days: usize,
    /// Trips considered.
    pub trip_count: usize,
    /// Model metrics on the held-out days.
    pub model: Option<Metrics>,
    /// Mean-predictor metrics on the held-out days.
    pub baseline: Option<Metrics>,
    /// In-sample model metrics on the training days.
    pub train_model: Option<Metrics>,
    /// In-sample mean-predictor metrics on the training days.
    pub train_baseline: Option<Metrics>,
    /// Baseline MAE minus model MAE.
    pub mae_improvement: Option<f64>,
    /// Baseline RMSE minus model RMSE.
    pub rmse_improvement: Option<f64>,
    /// Held-out actual values.
    pub actual: Vec<f64>,
    /// Model predictions for the held-out days.
    pub predicted: Vec<f64>,
}

impl Evaluation {
    fn insufficient(total_days: usize) -> Self {
        Self {
            status: EvaluationStatus::InsufficientData,
            total_days,
            train_days: 0,
            test_days: 0,
            trip_count: 0,
            model: None,
            baseline: None,
            train_model: None,
            train_baseline: None,
            mae_improvement: None,
            rmse_improvement: None,
            actual: Vec::new(),
            predicted: Vec::new(),
        }
    }
}

/// Backtest over every trip logged up to `now`.
///
/// The trailing forecast window does not apply here: the whole history is
/// split, so a user who stopped logging a while ago is still evaluated.
#[must_use]
pub fn evaluate(trips: &[TripRecord], now: DateTime<Utc>, config: &AnalysisConfig) -> Evaluation {
    let history: Vec<&TripRecord> = trips.iter().filter(|trip| trip.timestamp <= now).collect();
    let series = series_values(&daily_totals(&history));
    let mut evaluation = evaluate_series(&series, config.smoothing_alpha);
    evaluation.trip_count = history.len();
    evaluation
}

/// Backtest a daily series directly.
#[must_use]
pub fn evaluate_series(series: &[f64], alpha: f64) -> Evaluation {
    let total_days = series.len();
    if total_days < MIN_EVALUATION_POINTS {
        return Evaluation::insufficient(total_days);
    }

    let split = ((total_days as f64) * TRAIN_FRACTION).floor() as usize;
    let (train, test) = series.split_at(split);

    let level = smooth(train, alpha);
    let slope = least_squares_slope(train);
    let predicted: Vec<f64> = (1..=test.len())
        .map(|h| (level + slope * h as f64).max(0.0))
        .collect();

    let train_mean = train.iter().sum::<f64>() / train.len() as f64;
    let baseline_predictions = vec![train_mean; test.len()];

    let model = metrics(test, &predicted);
    let baseline = metrics(test, &baseline_predictions);
    let train_model = metrics(train, &in_sample_fit(train, alpha, slope));
    let train_baseline = metrics(train, &vec![train_mean; train.len()]);

    debug!(
        train_days = train.len(),
        test_days = test.len(),
        mae = model.mae,
        baseline_mae = baseline.mae,
        train_mae = train_model.mae,
        "Backtest complete"
    );

    Evaluation {
        status: EvaluationStatus::Success,
        total_days,
        train_days: train.len(),
        test_days: test.len(),
        trip_count: 0,
        model: Some(model),
        baseline: Some(baseline),
        train_model: Some(train_model),
        train_baseline: Some(train_baseline),
        mae_improvement: Some(baseline.mae - model.mae),
        rmse_improvement: Some(baseline.rmse - model.rmse),
        actual: test.to_vec(),
        predicted,
    }
}

/// One-step-ahead fits over the training part.
///
/// Day `i` is predicted from the EWMA of days `0..i` plus one step of the
/// training slope. The first day has no history and is fitted as itself.
fn in_sample_fit(train: &[f64], alpha: f64, slope: f64) -> Vec<f64> {
    let Some((&first, rest)) = train.split_first() else {
        return Vec::new();
    };

    let mut fitted = Vec::with_capacity(train.len());
    fitted.push(first);
    let mut state = first;
    for &value in rest {
        fitted.push((state + slope).max(0.0));
        state = alpha * value + (1.0 - alpha) * state;
    }
    fitted
}

/// Backtest outcome for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEvaluation {
    /// User the records belong to.
    pub user_id: String,
    /// The backtest, or the reason the records could not be read.
    pub outcome: UserOutcome,
}

/// What happened when a user was evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserOutcome {
    /// The records were read and backtested (possibly with too little data).
    Evaluated(Evaluation),
    /// Reading the records failed.
    Error(String),
}

impl UserEvaluation {
    /// The backtest, if the records could be read.
    pub fn evaluation(&self) -> Option<&Evaluation> {
        match &self.outcome {
            UserOutcome::Evaluated(evaluation) => Some(evaluation),
            UserOutcome::Error(_) => None,
        }
    }
}

/// Backtest every user, reading their trips through `fetch_trips`.
///
/// A user whose trips cannot be read is recorded as an error and the run
/// moves on to the next user.
pub fn evaluate_users<F>(
    users: &[String],
    mut fetch_trips: F,
    now: DateTime<Utc>,
    config: &AnalysisConfig,
) -> Vec<UserEvaluation>
where
    F: FnMut(&str) -> Result<Vec<TripRecord>>,
{
    users
        .iter()
        .map(|user| {
            let outcome = match fetch_trips(user) {
                Ok(trips) => UserOutcome::Evaluated(evaluate(&trips, now, config)),
                Err(e) => {
                    warn!(user = %user, error = %e, "Could not evaluate user");
                    UserOutcome::Error(e.to_string())
                }
            };
            UserEvaluation {
                user_id: user.clone(),
                outcome,
            }
        })
        .collect()
}

/// Spread of one metric across users.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl MetricSummary {
    fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Held-out metrics summarized across the successful backtests.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Mean absolute error.
    pub mae: MetricSummary,
    /// Root mean squared error.
    pub rmse: MetricSummary,
    /// Coefficient of determination.
    pub r2: MetricSummary,
    /// Mean absolute percentage error, in percent.
    pub mape: MetricSummary,
    /// Share within 2 kg, in percent.
    pub within_2kg: MetricSummary,
    /// Share within 5 kg, in percent.
    pub within_5kg: MetricSummary,
}

/// Summary of a multi-user backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEvaluation {
    /// Users attempted.
    pub total_users: usize,
    /// Users with metrics.
    pub successful: usize,
    /// Users with too few daily points.
    pub insufficient_data: usize,
    /// Users whose records could not be read.
    pub errors: usize,
    /// Held-out model metrics; absent when no backtest succeeded.
    pub metrics: Option<AggregateMetrics>,
}

/// Summarize per-user backtests.
#[must_use]
pub fn aggregate(results: &[UserEvaluation]) -> AggregateEvaluation {
    let models: Vec<Metrics> = results
        .iter()
        .filter_map(UserEvaluation::evaluation)
        .filter_map(|evaluation| evaluation.model)
        .collect();
    let insufficient_data = results
        .iter()
        .filter_map(UserEvaluation::evaluation)
        .filter(|evaluation| evaluation.status == EvaluationStatus::InsufficientData)
        .count();
    let errors = results.iter().filter(|r| r.evaluation().is_none()).count();

    let metrics = (!models.is_empty()).then(|| {
        let spread = |get: fn(&Metrics) -> f64| MetricSummary::of(&models.iter().map(get).collect::<Vec<_>>());
        AggregateMetrics {
            mae: spread(|m| m.mae),
            rmse: spread(|m| m.rmse),
            r2: spread(|m| m.r2),
            mape: spread(|m| m.mape),
            within_2kg: spread(|m| m.within_2kg),
            within_5kg: spread(|m| m.within_5kg),
        }
    });

    AggregateEvaluation {
        total_users: results.len(),
        successful: models.len(),
        insufficient_data,
        errors,
        metrics,
    }
}

/// Accuracy metrics of `predicted` against `actual`.
///
/// R² is 0 when the actual values have no variance.
#[must_use]
pub fn metrics(actual: &[f64], predicted: &[f64]) -> Metrics {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return Metrics::default();
    }
    let pairs = || actual.iter().zip(predicted.iter()).take(n);
    let count = n as f64;

    let mae = pairs().map(|(a, p)| (a - p).abs()).sum::<f64>() / count;
    let sse: f64 = pairs().map(|(a, p)| (a - p).powi(2)).sum();
    let rmse = (sse / count).sqrt();

    let mean_actual = actual.iter().take(n).sum::<f64>() / count;
    let sst: f64 = actual.iter().take(n).map(|a| (a - mean_actual).powi(2)).sum();
    let r2 = if sst > 0.0 { 1.0 - sse / sst } else { 0.0 };

    let (mape_sum, mape_count) = pairs()
        .filter(|(a, _)| **a != 0.0)
        .fold((0.0, 0usize), |(sum, k), (a, p)| (sum + ((a - p) / a).abs(), k + 1));
    let mape = if mape_count == 0 {
        0.0
    } else {
        mape_sum / mape_count as f64 * 100.0
    };

    let within = |limit: f64| pairs().filter(|(a, p)| (*a - *p).abs() <= limit).count() as f64 / count * 100.0;

    Metrics {
        mae,
        rmse,
        r2,
        mape,
        within_2kg: within(2.0),
        within_5kg: within(5.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FootprintError;
    use crate::model::Vehicle;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 20, 0, 0).unwrap()
    }

    /// One trip per day for `days` days, the newest `gap_days` before `now`.
    fn daily_trips(days: i64, gap_days: i64, emission_kg: f64) -> Vec<TripRecord> {
        (0..days)
            .rev()
            .map(|i| {
                let ts = now() - Duration::days(gap_days + i);
                TripRecord::new(ts, 5.0, emission_kg, Vehicle::Car).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data() {
        let evaluation = evaluate_series(&[1.0; 13], 0.3);
        assert_eq!(evaluation.status, EvaluationStatus::InsufficientData);
        assert!(evaluation.model.is_none());
        assert_eq!(evaluation.total_days, 13);
    }

    #[test]
    fn test_constant_series_is_predicted_exactly() {
        let evaluation = evaluate_series(&[3.0; 20], 0.3);
        assert_eq!(evaluation.status, EvaluationStatus::Success);
        assert_eq!(evaluation.train_days, 16);
        assert_eq!(evaluation.test_days, 4);

        let model = evaluation.model.unwrap();
        assert!(model.mae < 1e-9);
        assert_eq!(model.within_2kg, 100.0);
        assert!(model.mape < 1e-9);
    }

    #[test]
    fn test_linear_series_beats_mean_baseline() {
        let series: Vec<f64> = (0..20).map(|i| 1.0 + 0.5 * i as f64).collect();
        let evaluation = evaluate_series(&series, 0.3);

        assert!(evaluation.mae_improvement.unwrap() > 0.0);
        assert!(evaluation.rmse_improvement.unwrap() > 0.0);
        assert_eq!(evaluation.predicted.len(), evaluation.actual.len());
    }

    #[test]
    fn test_predictions_never_negative() {
        let series: Vec<f64> = (0..15).map(|i| (14 - i) as f64).collect();
        let evaluation = evaluate_series(&series, 0.3);
        assert!(evaluation.predicted.iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn test_metrics_values() {
        let m = metrics(&[2.0, 4.0, 0.0], &[1.0, 4.0, 3.0]);
        assert!((m.mae - 4.0 / 3.0).abs() < 1e-12);
        assert!((m.rmse - (10.0f64 / 3.0).sqrt()).abs() < 1e-12);
        // Zero actual is skipped: (0.5 + 0) / 2
        assert!((m.mape - 25.0).abs() < 1e-9);
        assert!((m.within_2kg - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.within_5kg, 100.0);
        // mean 2, sst 8, sse 10
        assert!((m.r2 - (1.0 - 10.0 / 8.0)).abs() < 1e-12);
    }

    #[test]
    fn test_history_outside_forecast_window_is_evaluated() {
        let trips = daily_trips(60, 20, 2.0);
        let evaluation = evaluate(&trips, now(), &AnalysisConfig::default());

        assert_eq!(evaluation.status, EvaluationStatus::Success);
        assert_eq!(evaluation.total_days, 60);
        assert_eq!(evaluation.trip_count, 60);
        assert_eq!(evaluation.train_days, 48);
        assert_eq!(evaluation.test_days, 12);
    }

    #[test]
    fn test_trips_after_reference_instant_are_ignored() {
        let mut trips = daily_trips(10, 0, 2.0);
        trips.extend((1..=10).map(|i| {
            TripRecord::new(now() + Duration::days(i), 5.0, 2.0, Vehicle::Car).unwrap()
        }));

        let evaluation = evaluate(&trips, now(), &AnalysisConfig::default());
        assert_eq!(evaluation.status, EvaluationStatus::InsufficientData);
        assert_eq!(evaluation.total_days, 10);
    }

    #[test]
    fn test_train_metrics_are_reported() {
        let evaluation = evaluate_series(&[3.0; 20], 0.3);

        let train_model = evaluation.train_model.unwrap();
        let train_baseline = evaluation.train_baseline.unwrap();
        assert!(train_model.mae < 1e-9);
        assert!(train_baseline.mae < 1e-9);
        assert_eq!(train_model.within_2kg, 100.0);
    }

    #[test]
    fn test_in_sample_fit_is_one_step_ahead() {
        // state 2 -> 0.5*4 + 0.5*2 = 3
        let fitted = in_sample_fit(&[2.0, 4.0, 6.0], 0.5, 1.0);
        assert_eq!(fitted, vec![2.0, 3.0, 4.0]);
        assert!(in_sample_fit(&[], 0.3, 0.0).is_empty());
    }

    #[test]
    fn test_evaluate_users_records_errors_and_continues() {
        let users = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
        let results = evaluate_users(
            &users,
            |user| match user {
                "alice" => Ok(daily_trips(30, 0, 2.0)),
                "bob" => Ok(daily_trips(5, 0, 2.0)),
                _ => Err(FootprintError::Storage {
                    message: "database is locked".to_string(),
                    source: None,
                }),
            },
            now(),
            &AnalysisConfig::default(),
        );

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].evaluation().unwrap().status, EvaluationStatus::Success);
        assert_eq!(
            results[1].evaluation().unwrap().status,
            EvaluationStatus::InsufficientData
        );
        assert!(matches!(results[2].outcome, UserOutcome::Error(_)));

        let summary = aggregate(&results);
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.insufficient_data, 1);
        assert_eq!(summary.errors, 1);
        assert!(summary.metrics.unwrap().mae.mean < 1e-9);
    }

    #[test]
    fn test_aggregate_spread() {
        let evaluated = |mae: f64| UserEvaluation {
            user_id: format!("user-{mae}"),
            outcome: UserOutcome::Evaluated(Evaluation {
                model: Some(Metrics {
                    mae,
                    ..Metrics::default()
                }),
                status: EvaluationStatus::Success,
                ..Evaluation::insufficient(20)
            }),
        };

        let summary = aggregate(&[evaluated(1.0), evaluated(3.0)]);
        let mae = summary.metrics.unwrap().mae;
        assert_eq!(mae.mean, 2.0);
        assert_eq!(mae.std, 1.0);
        assert_eq!(mae.min, 1.0);
        assert_eq!(mae.max, 3.0);
    }

    #[test]
    fn test_aggregate_without_successes_has_no_metrics() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total_users, 0);
        assert!(summary.metrics.is_none());
    }
}
