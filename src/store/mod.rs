//! SQLite-backed record store.
//!
//! Holds the trips and bills of every user. Records are never updated in
//! place; the only mutations are insert and delete. The analytics core
//! reads from here through [`RecordStore::snapshot`] and never writes back.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::AnalysisConfig;
use crate::error::{FootprintError, Result};
use crate::model::{RecordSnapshot, TripRecord, UtilityBillRecord, Vehicle};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS trips (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    timestamp   TEXT NOT NULL,
    distance_km REAL NOT NULL CHECK (distance_km > 0),
    emission_kg REAL NOT NULL CHECK (emission_kg >= 0),
    vehicle     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trips_user_time ON trips(user_id, timestamp);

CREATE TABLE IF NOT EXISTS bills (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    timestamp   TEXT NOT NULL,
    period      TEXT NOT NULL,
    units_kwh   REAL NOT NULL CHECK (units_kwh > 0),
    emission_kg REAL NOT NULL CHECK (emission_kg >= 0)
);
CREATE INDEX IF NOT EXISTS idx_bills_user_time ON bills(user_id, timestamp);
";

/// Which table a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// The trips table.
    Trip,
    /// The bills table.
    Bill,
}

impl RecordKind {
    fn table(self) -> &'static str {
        match self {
            Self::Trip => "trips",
            Self::Bill => "bills",
        }
    }
}

/// Counts reported by [`RecordStore::import_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    /// Trips inserted.
    pub trips: usize,
    /// Bills inserted.
    pub bills: usize,
    /// Records skipped because their id already existed.
    pub skipped: usize,
}

/// A trip as it appears in an import file.
#[derive(Debug, Clone, Deserialize)]
struct ImportTrip {
    #[serde(default)]
    id: Option<String>,
    timestamp: DateTime<Utc>,
    distance_km: f64,
    #[serde(default)]
    emission_kg: Option<f64>,
    #[serde(default)]
    vehicle: Option<String>,
}

/// A bill as it appears in an import file.
#[derive(Debug, Clone, Deserialize)]
struct ImportBill {
    #[serde(default)]
    id: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    period: Option<String>,
    units_kwh: f64,
    #[serde(default)]
    emission_kg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ImportFile {
    #[serde(default)]
    trips: Vec<ImportTrip>,
    #[serde(default)]
    bills: Vec<ImportBill>,
}

/// Record store over a SQLite connection.
#[derive(Debug)]
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FootprintError::io(format!("Failed to create directory: {}", parent.display()), e)
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| FootprintError::storage(format!("Failed to open database: {}", path.display()), e))?;
        Self::with_connection(conn)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FootprintError::storage("Failed to open in-memory database", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| FootprintError::storage("Failed to create schema", e))?;
        Ok(Self { conn })
    }

    /// Insert a trip.
    #[instrument(skip(self, trip), fields(id = %trip.id))]
    pub fn add_trip(&self, user: &str, trip: &TripRecord) -> Result<()> {
        trip.validate()?;
        self.conn.execute(
            "INSERT INTO trips (id, user_id, timestamp, distance_km, emission_kg, vehicle)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                trip.id,
                user,
                encode_timestamp(trip.timestamp),
                trip.distance_km,
                trip.emission_kg,
                trip.vehicle.label(),
            ],
        )?;
        info!(user, vehicle = %trip.vehicle, "Trip stored");
        Ok(())
    }

    /// Insert a bill.
    #[instrument(skip(self, bill), fields(id = %bill.id))]
    pub fn add_bill(&self, user: &str, bill: &UtilityBillRecord) -> Result<()> {
        bill.validate()?;
        self.conn.execute(
            "INSERT INTO bills (id, user_id, timestamp, period, units_kwh, emission_kg)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                bill.id,
                user,
                encode_timestamp(bill.timestamp),
                bill.period,
                bill.units_kwh,
                bill.emission_kg,
            ],
        )?;
        info!(user, period = %bill.period, "Bill stored");
        Ok(())
    }

    /// Trips of a user, oldest first.
    pub fn trips(&self, user: &str) -> Result<Vec<TripRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, distance_km, emission_kg, vehicle
             FROM trips WHERE user_id = ?1 ORDER BY timestamp, rowid",
        )?;
        let trips = stmt
            .query_map(params![user], trip_from_row)?
            .map(|row| row.map_err(FootprintError::from).and_then(|r| r))
            .collect::<Result<Vec<_>>>();
        trips
    }

    /// Bills of a user, oldest first.
    pub fn bills(&self, user: &str) -> Result<Vec<UtilityBillRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, period, units_kwh, emission_kg
             FROM bills WHERE user_id = ?1 ORDER BY timestamp, rowid",
        )?;
        let bills = stmt
            .query_map(params![user], bill_from_row)?
            .map(|row| row.map_err(FootprintError::from).and_then(|r| r))
            .collect::<Result<Vec<_>>>();
        bills
    }

    /// Owned snapshot of a user's records.
    #[instrument(skip(self))]
    pub fn snapshot(&self, user: &str) -> Result<RecordSnapshot> {
        let snapshot = RecordSnapshot::new(self.trips(user)?, self.bills(user)?);
        debug!(
            trips = snapshot.trips.len(),
            bills = snapshot.bills.len(),
            "Captured snapshot"
        );
        Ok(snapshot)
    }

    /// Every user id that owns at least one record.
    pub fn users(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id FROM trips UNION SELECT user_id FROM bills ORDER BY 1",
        )?;
        let users = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Delete a trip by id or unique id prefix. Returns the full id.
    pub fn delete_trip(&self, user: &str, id: &str) -> Result<String> {
        self.delete(RecordKind::Trip, user, id)
    }

    /// Delete a bill by id or unique id prefix. Returns the full id.
    pub fn delete_bill(&self, user: &str, id: &str) -> Result<String> {
        self.delete(RecordKind::Bill, user, id)
    }

    #[instrument(skip(self))]
    fn delete(&self, kind: RecordKind, user: &str, prefix: &str) -> Result<String> {
        let full_id = self.resolve_id(kind, user, prefix)?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        self.conn.execute(&sql, params![full_id])?;
        info!(id = %full_id, "Record deleted");
        Ok(full_id)
    }

    fn resolve_id(&self, kind: RecordKind, user: &str, prefix: &str) -> Result<String> {
        if prefix.is_empty() {
            return Err(FootprintError::InvalidArgument {
                name: "id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let exact_sql = format!("SELECT id FROM {} WHERE user_id = ?1 AND id = ?2", kind.table());
        let exact: Option<String> = self
            .conn
            .query_row(&exact_sql, params![user, prefix], |row| row.get(0))
            .optional()?;
        if let Some(id) = exact {
            return Ok(id);
        }

        let sql = format!(
            "SELECT id FROM {} WHERE user_id = ?1 AND substr(id, 1, length(?2)) = ?2",
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let matches = stmt
            .query_map(params![user, prefix], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match matches.len() {
            0 => Err(FootprintError::RecordNotFound {
                id: prefix.to_string(),
            }),
            1 => Ok(matches.into_iter().next().unwrap_or_default()),
            n => Err(FootprintError::AmbiguousRecord {
                id: prefix.to_string(),
                matches: n,
            }),
        }
    }

    /// Import `{ "trips": [...], "bills": [...] }` from a JSON file.
    ///
    /// Missing ids are generated, missing trip emissions are estimated from
    /// the configured emission factors and missing bill emissions from the
    /// grid intensity. The whole file is validated before anything is
    /// written; ids that already exist are skipped.
    #[instrument(skip(self, path, config), fields(path = %path.as_ref().display()))]
    pub fn import_json(&mut self, path: impl AsRef<Path>, user: &str, config: &AnalysisConfig) -> Result<ImportSummary> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FootprintError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| FootprintError::io(format!("Failed to read {}", path.display()), e))?;
        let file: ImportFile = serde_json::from_str(&content).map_err(|e| FootprintError::SerializationError {
            context: format!("Failed to parse {}", path.display()),
            source: e,
        })?;

        let trips = file
            .trips
            .into_iter()
            .map(|t| {
                let vehicle = Vehicle::parse(t.vehicle.as_deref().unwrap_or_default());
                let emission = t
                    .emission_kg
                    .unwrap_or_else(|| config.emission_factors.estimate(&vehicle, t.distance_km));
                let id = t.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                TripRecord::with_id(id, t.timestamp, t.distance_km, emission, vehicle)
            })
            .collect::<Result<Vec<_>>>()?;

        let bills = file
            .bills
            .into_iter()
            .map(|b| {
                let emission = b.emission_kg.unwrap_or(b.units_kwh * config.grid_intensity);
                let period = b
                    .period
                    .unwrap_or_else(|| b.timestamp.format("%Y-%m").to_string());
                let id = b.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                UtilityBillRecord::with_id(id, b.timestamp, period, b.units_kwh, emission)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut summary = ImportSummary::default();
        let tx = self.conn.transaction()?;
        for trip in &trips {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO trips (id, user_id, timestamp, distance_km, emission_kg, vehicle)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    trip.id,
                    user,
                    encode_timestamp(trip.timestamp),
                    trip.distance_km,
                    trip.emission_kg,
                    trip.vehicle.label(),
                ],
            )?;
            if inserted == 0 {
                summary.skipped += 1;
            } else {
                summary.trips += 1;
            }
        }
        for bill in &bills {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO bills (id, user_id, timestamp, period, units_kwh, emission_kg)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    bill.id,
                    user,
                    encode_timestamp(bill.timestamp),
                    bill.period,
                    bill.units_kwh,
                    bill.emission_kg,
                ],
            )?;
            if inserted == 0 {
                summary.skipped += 1;
            } else {
                summary.bills += 1;
            }
        }
        tx.commit()?;

        info!(
            trips = summary.trips,
            bills = summary.bills,
            skipped = summary.skipped,
            "Import complete"
        );
        Ok(summary)
    }
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| FootprintError::Storage {
            message: format!("Corrupt timestamp '{raw}': {e}"),
            source: None,
        })
}

fn trip_from_row(row: &Row<'_>) -> rusqlite::Result<Result<TripRecord>> {
    let id: String = row.get(0)?;
    let timestamp: String = row.get(1)?;
    let distance_km: f64 = row.get(2)?;
    let emission_kg: f64 = row.get(3)?;
    let vehicle: String = row.get(4)?;

    Ok(decode_timestamp(&timestamp).and_then(|ts| {
        TripRecord::with_id(id, ts, distance_km, emission_kg, Vehicle::from_label(&vehicle))
    }))
}

fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<Result<UtilityBillRecord>> {
    let id: String = row.get(0)?;
    let timestamp: String = row.get(1)?;
    let period: String = row.get(2)?;
    let units_kwh: f64 = row.get(3)?;
    let emission_kg: f64 = row.get(4)?;

    Ok(decode_timestamp(&timestamp)
        .and_then(|ts| UtilityBillRecord::with_id(id, ts, period, units_kwh, emission_kg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap()
    }

    fn trip(id: &str, day: u32, vehicle: Vehicle) -> TripRecord {
        TripRecord::with_id(id, ts(day), 12.0, 2.5, vehicle).unwrap()
    }

    #[test]
    fn test_add_and_list_trips_ordered_by_time() {
        let store = RecordStore::open_in_memory().unwrap();
        store.add_trip("alice", &trip("b-2", 5, Vehicle::Bus)).unwrap();
        store.add_trip("alice", &trip("a-1", 2, Vehicle::parse("Tuk-tuk"))).unwrap();
        store.add_trip("bob", &trip("c-3", 3, Vehicle::Car)).unwrap();

        let trips = store.trips("alice").unwrap();
        let ids: Vec<&str> = trips.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a-1", "b-2"]);
        assert_eq!(trips[0].vehicle, Vehicle::Custom("Tuk-tuk".to_string()));
        assert_eq!(trips[0].timestamp, ts(2));
    }

    #[test]
    fn test_custom_vehicle_named_like_base_survives_storage() {
        let store = RecordStore::open_in_memory().unwrap();
        store.add_trip("alice", &trip("a-1", 2, Vehicle::custom("car"))).unwrap();
        store.add_trip("alice", &trip("a-2", 3, Vehicle::Car)).unwrap();

        let trips = store.trips("alice").unwrap();
        assert_eq!(trips[0].vehicle, Vehicle::Custom("car".to_string()));
        assert_eq!(trips[1].vehicle, Vehicle::Car);
    }

    #[test]
    fn test_snapshot_and_users() {
        let store = RecordStore::open_in_memory().unwrap();
        store.add_trip("alice", &trip("t1", 2, Vehicle::Car)).unwrap();
        let bill = UtilityBillRecord::with_id("b1", ts(1), "2025-02", 300.0, 135.0).unwrap();
        store.add_bill("carol", &bill).unwrap();

        assert_eq!(store.users().unwrap(), vec!["alice", "carol"]);

        let snapshot = store.snapshot("carol").unwrap();
        assert!(snapshot.trips.is_empty());
        assert_eq!(snapshot.bills, vec![bill]);
        assert!(store.snapshot("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_delete_by_prefix() {
        let store = RecordStore::open_in_memory().unwrap();
        store.add_trip("alice", &trip("abc123", 2, Vehicle::Car)).unwrap();
        store.add_trip("alice", &trip("abd456", 3, Vehicle::Car)).unwrap();

        let err = store.delete_trip("alice", "ab").unwrap_err();
        assert!(matches!(err, FootprintError::AmbiguousRecord { matches: 2, .. }));

        assert_eq!(store.delete_trip("alice", "abc").unwrap(), "abc123");
        assert_eq!(store.trips("alice").unwrap().len(), 1);

        let err = store.delete_trip("alice", "zzz").unwrap_err();
        assert!(matches!(err, FootprintError::RecordNotFound { .. }));

        // Other users' records are invisible
        assert!(store.delete_trip("bob", "abd").is_err());
    }

    #[test]
    fn test_delete_bill() {
        let store = RecordStore::open_in_memory().unwrap();
        let bill = UtilityBillRecord::with_id("bill-1", ts(1), "2025-02", 100.0, 45.0).unwrap();
        store.add_bill("alice", &bill).unwrap();
        assert_eq!(store.delete_bill("alice", "bill").unwrap(), "bill-1");
        assert!(store.bills("alice").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_id_is_storage_error() {
        let store = RecordStore::open_in_memory().unwrap();
        store.add_trip("alice", &trip("same", 2, Vehicle::Car)).unwrap();
        let err = store.add_trip("alice", &trip("same", 3, Vehicle::Car)).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_codes::EXIT_STORAGE_ERROR);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");
        {
            let store = RecordStore::open(&path).unwrap();
            store.add_trip("alice", &trip("persisted", 2, Vehicle::Train)).unwrap();
        }
        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.trips("alice").unwrap()[0].id, "persisted");
    }

    #[test]
    fn test_import_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let base = ts(10);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "trips": [
                    {{"id": "imp-1", "timestamp": "{}", "distance_km": 10.0, "vehicle": "car"}},
                    {{"timestamp": "{}", "distance_km": 4.0, "emission_kg": 0.0, "vehicle": "bike"}}
                ],
                "bills": [
                    {{"timestamp": "{}", "units_kwh": 200.0}}
                ]
            }}"#,
            base.to_rfc3339(),
            (base + Duration::days(1)).to_rfc3339(),
            base.to_rfc3339(),
        )
        .unwrap();

        let mut store = RecordStore::open_in_memory().unwrap();
        let config = AnalysisConfig::default();
        let summary = store.import_json(&path, "alice", &config).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                trips: 2,
                bills: 1,
                skipped: 0,
            }
        );

        let trips = store.trips("alice").unwrap();
        assert!((trips[0].emission_kg - 2.1).abs() < 1e-9);
        let bills = store.bills("alice").unwrap();
        assert!((bills[0].emission_kg - 90.0).abs() < 1e-9);
        assert_eq!(bills[0].period, "2025-03");

        // Re-importing skips the record with a fixed id
        let again = store.import_json(&path, "alice", &config).unwrap();
        assert_eq!(again.skipped, 1);
        assert_eq!(again.trips, 1);
    }

    #[test]
    fn test_import_rejects_invalid_records_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"trips": [
                {"timestamp": "2025-03-01T08:00:00Z", "distance_km": 3.0},
                {"timestamp": "2025-03-02T08:00:00Z", "distance_km": -1.0}
            ]}"#,
        )
        .unwrap();

        let mut store = RecordStore::open_in_memory().unwrap();
        let err = store
            .import_json(&path, "alice", &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, FootprintError::InvalidRecord { .. }));
        assert!(store.trips("alice").unwrap().is_empty());
    }

    #[test]
    fn test_import_missing_file() {
        let mut store = RecordStore::open_in_memory().unwrap();
        let err = store
            .import_json("/definitely/not/here.json", "alice", &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, FootprintError::FileNotFound { .. }));
    }
}
