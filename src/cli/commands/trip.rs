//! Trip command implementation.

use tracing::info;

use crate::cli::{Cli, OutputFormat, TripAction, TripArgs};
use crate::error::Result;
use crate::model::{TripRecord, Vehicle};

use super::{instant_or_now, load_config, open_store, short_id, user_id};

/// Run the trip command.
pub fn run(cli: &Cli, args: &TripArgs) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(cli, &config)?;
    let user = user_id(cli, &config);

    match &args.action {
        TripAction::Add {
            distance,
            emission,
            vehicle,
            custom_vehicle,
            at,
        } => {
            let vehicle = custom_vehicle
                .as_deref()
                .map_or_else(|| Vehicle::parse(vehicle), Vehicle::custom);
            let timestamp = instant_or_now(at.as_deref())?;
            let emission = emission
                .unwrap_or_else(|| config.analysis.emission_factors.estimate(&vehicle, *distance));
            let trip = TripRecord::new(timestamp, *distance, emission, vehicle)?;
            store.add_trip(&user, &trip)?;
            info!(id = %trip.id, user = %user, "Trip logged");

            match cli.effective_output() {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&trip)?),
                _ if cli.quiet => println!("{}", trip.id),
                _ => println!(
                    "Logged trip {} ({:.1} km by {}, {:.2} kg CO2e)",
                    short_id(&trip.id),
                    trip.distance_km,
                    trip.vehicle,
                    trip.emission_kg
                ),
            }
        }
        TripAction::List { limit } => {
            let mut trips = store.trips(&user)?;
            if let Some(limit) = limit {
                let skip = trips.len().saturating_sub(*limit);
                trips.drain(..skip);
            }
            print_trips(cli, &trips)?;
        }
        TripAction::Rm { id } => {
            let removed = store.delete_trip(&user, id)?;
            if !cli.quiet {
                println!("Deleted trip {removed}");
            }
        }
    }
    Ok(())
}

fn print_trips(cli: &Cli, trips: &[TripRecord]) -> Result<()> {
    match cli.effective_output() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(trips)?),
        OutputFormat::Tsv => {
            println!("id\ttimestamp\tdistance_km\temission_kg\tvehicle");
            for trip in trips {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    trip.id,
                    trip.timestamp.to_rfc3339(),
                    trip.distance_km,
                    trip.emission_kg,
                    trip.vehicle
                );
            }
        }
        OutputFormat::Text => {
            if trips.is_empty() {
                println!("No trips recorded.");
                return Ok(());
            }
            println!("{:<8}  {:<16}  {:>8}  {:>8}  Vehicle", "ID", "When", "km", "kg");
            for trip in trips {
                println!(
                    "{:<8}  {:<16}  {:>8.1}  {:>8.2}  {}",
                    short_id(&trip.id),
                    trip.timestamp.format("%Y-%m-%d %H:%M"),
                    trip.distance_km,
                    trip.emission_kg,
                    trip.vehicle
                );
            }
        }
    }
    Ok(())
}
