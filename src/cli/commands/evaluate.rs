//! Evaluate command implementation.

use crate::analytics::evaluation::{
    aggregate, evaluate, evaluate_users, AggregateEvaluation, Evaluation, EvaluationStatus,
    MetricSummary, Metrics, UserEvaluation, MIN_EVALUATION_POINTS,
};
use crate::cli::{Cli, EvaluateArgs, OutputFormat};
use crate::error::Result;
use crate::util::sparkline;

use super::{instant_or_now, load_config, open_store, user_id};

/// Run the evaluate command.
pub fn run(cli: &Cli, args: &EvaluateArgs) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(cli, &config)?;
    let user = user_id(cli, &config);
    let now = instant_or_now(args.now.as_deref())?;

    if args.all {
        let users = store.users()?;
        let results = evaluate_users(&users, |id| store.trips(id), now, &config.analysis);
        let summary = aggregate(&results);
        match cli.effective_output() {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "summary": summary,
                    "users": results,
                }))?
            ),
            _ => print_summary(&results, &summary),
        }
        return Ok(());
    }

    let trips = store.trips(&user)?;
    let result = evaluate(&trips, now, &config.analysis);

    match cli.effective_output() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_report(&result, args.detail),
    }
    Ok(())
}

fn print_report(result: &Evaluation, detail: bool) {
    println!("Backtest over {} trip(s), {} active day(s)", result.trip_count, result.total_days);

    if result.status == EvaluationStatus::InsufficientData {
        println!(
            "Not enough data: need at least {MIN_EVALUATION_POINTS} active days, have {}.",
            result.total_days
        );
        return;
    }

    println!("Train {} day(s), test {} day(s)", result.train_days, result.test_days);
    println!();
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10}",
        "Metric", "Model", "Baseline", "Train", "Train base"
    );
    if let (Some(model), Some(baseline), Some(train), Some(train_base)) = (
        &result.model,
        &result.baseline,
        &result.train_model,
        &result.train_baseline,
    ) {
        let rows: [(&str, fn(&Metrics) -> f64); 6] = [
            ("MAE", |m| m.mae),
            ("RMSE", |m| m.rmse),
            ("R2", |m| m.r2),
            ("MAPE %", |m| m.mape),
            ("within 2kg %", |m| m.within_2kg),
            ("within 5kg %", |m| m.within_5kg),
        ];
        for (label, get) in rows {
            println!(
                "{label:<12} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
                get(model),
                get(baseline),
                get(train),
                get(train_base)
            );
        }
    }
    if let Some(improvement) = result.mae_improvement {
        println!();
        println!("MAE improvement over mean baseline: {improvement:+.3} kg");
    }

    if detail {
        println!();
        println!("actual    {}", sparkline(&result.actual));
        println!("predicted {}", sparkline(&result.predicted));
        for (actual, predicted) in result.actual.iter().zip(&result.predicted) {
            println!("  {actual:>8.2}  {predicted:>8.2}");
        }
    }
}

fn print_summary(results: &[UserEvaluation], summary: &AggregateEvaluation) {
    println!(
        "Backtested {} user(s): {} evaluated, {} with too little data, {} failed",
        summary.total_users, summary.successful, summary.insufficient_data, summary.errors
    );

    for result in results {
        let line = match result.evaluation() {
            Some(evaluation) => match evaluation.model {
                Some(model) => format!("MAE {:.3} over {} test day(s)", model.mae, evaluation.test_days),
                None => format!("insufficient data ({} active day(s))", evaluation.total_days),
            },
            None => "error".to_string(),
        };
        println!("  {:<20} {line}", result.user_id);
    }

    let Some(metrics) = &summary.metrics else {
        return;
    };
    println!();
    println!("{:<12} {:>10} {:>10} {:>10} {:>10}", "Metric", "Mean", "Std", "Min", "Max");
    let rows: [(&str, MetricSummary); 6] = [
        ("MAE", metrics.mae),
        ("RMSE", metrics.rmse),
        ("R2", metrics.r2),
        ("MAPE %", metrics.mape),
        ("within 2kg %", metrics.within_2kg),
        ("within 5kg %", metrics.within_5kg),
    ];
    for (label, spread) in rows {
        println!(
            "{label:<12} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
            spread.mean, spread.std, spread.min, spread.max
        );
    }
}
