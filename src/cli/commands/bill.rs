//! Bill command implementation.

use tracing::info;

use crate::cli::{BillAction, BillArgs, Cli, OutputFormat};
use crate::error::Result;
use crate::model::UtilityBillRecord;

use super::{instant_or_now, load_config, open_store, short_id, user_id};

/// Run the bill command.
pub fn run(cli: &Cli, args: &BillArgs) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(cli, &config)?;
    let user = user_id(cli, &config);

    match &args.action {
        BillAction::Add { units, period, at } => {
            let timestamp = instant_or_now(at.as_deref())?;
            let period = period
                .clone()
                .unwrap_or_else(|| timestamp.format("%Y-%m").to_string());
            let bill =
                UtilityBillRecord::from_consumption(timestamp, period, *units, config.analysis.grid_intensity)?;
            store.add_bill(&user, &bill)?;
            info!(id = %bill.id, user = %user, "Bill logged");

            match cli.effective_output() {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bill)?),
                _ if cli.quiet => println!("{}", bill.id),
                _ => println!(
                    "Logged bill {} for {} ({:.0} kWh, {:.1} kg CO2e)",
                    short_id(&bill.id),
                    bill.period,
                    bill.units_kwh,
                    bill.emission_kg
                ),
            }
        }
        BillAction::List => {
            let bills = store.bills(&user)?;
            match cli.effective_output() {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bills)?),
                OutputFormat::Tsv => {
                    println!("id\ttimestamp\tperiod\tunits_kwh\temission_kg");
                    for bill in &bills {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            bill.id,
                            bill.timestamp.to_rfc3339(),
                            bill.period,
                            bill.units_kwh,
                            bill.emission_kg
                        );
                    }
                }
                OutputFormat::Text if bills.is_empty() => println!("No bills recorded."),
                OutputFormat::Text => {
                    println!("{:<8}  {:<10}  {:<10}  {:>8}  {:>8}", "ID", "Recorded", "Period", "kWh", "kg");
                    for bill in &bills {
                        println!(
                            "{:<8}  {:<10}  {:<10}  {:>8.0}  {:>8.1}",
                            short_id(&bill.id),
                            bill.timestamp.format("%Y-%m-%d"),
                            bill.period,
                            bill.units_kwh,
                            bill.emission_kg
                        );
                    }
                }
            }
        }
        BillAction::Rm { id } => {
            let removed = store.delete_bill(&user, id)?;
            if !cli.quiet {
                println!("Deleted bill {removed}");
            }
        }
    }
    Ok(())
}
