//! Travel trip records.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{FootprintError, Result};

/// Vehicle used for a trip.
///
/// Custom vehicle names are their own labels, distinct from the base
/// categories. [`Vehicle::parse`] reads free-form input leniently,
/// [`Vehicle::custom`] always yields a custom vehicle, and serialized
/// records go through [`Vehicle::from_label`], which only maps the exact
/// base labels back to base categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Vehicle {
    /// Private car.
    Car,
    /// Bus or coach.
    Bus,
    /// Train, tram or metro.
    Train,
    /// Bicycle.
    Bike,
    /// On foot.
    Walking,
    /// User-named vehicle.
    Custom(String),
}

impl Vehicle {
    /// All base categories in catalog order.
    pub const BASE: [Vehicle; 5] = [
        Vehicle::Car,
        Vehicle::Bus,
        Vehicle::Train,
        Vehicle::Bike,
        Vehicle::Walking,
    ];

    /// Parse user input, matching base categories case-insensitively.
    ///
    /// Aliases such as "bicycle" and "walk" are accepted. Anything else
    /// becomes a custom vehicle.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "car" => Self::Car,
            "bus" => Self::Bus,
            "train" => Self::Train,
            "bike" | "bicycle" => Self::Bike,
            "walking" | "walk" => Self::Walking,
            "" => Self::Custom("Unknown".to_string()),
            _ => Self::Custom(trimmed.to_string()),
        }
    }

    /// A user-named vehicle, kept custom even if it reads like a base category.
    #[must_use]
    pub fn custom(name: &str) -> Self {
        match name.trim() {
            "" => Self::Custom("Unknown".to_string()),
            trimmed => Self::Custom(trimmed.to_string()),
        }
    }

    /// Decode a label written by [`Vehicle::label`].
    ///
    /// Matching is exact, so a custom "car" or "Bicycle" stays custom. A
    /// custom name spelled exactly like a base label ("Car") cannot be told
    /// apart from it once stored and decodes as the base category.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "Car" => Self::Car,
            "Bus" => Self::Bus,
            "Train" => Self::Train,
            "Bike" => Self::Bike,
            "Walking" => Self::Walking,
            other => Self::custom(other),
        }
    }

    /// Display label used for frequency counting.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Car => "Car",
            Self::Bus => "Bus",
            Self::Train => "Train",
            Self::Bike => "Bike",
            Self::Walking => "Walking",
            Self::Custom(name) => name,
        }
    }

    /// Whether this is a user-named vehicle.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl From<String> for Vehicle {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<Vehicle> for String {
    fn from(value: Vehicle) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single logged trip.
///
/// Immutable once created; the only mutation the system supports is
/// deleting the record from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Unique record id.
    pub id: String,
    /// When the trip happened.
    pub timestamp: DateTime<Utc>,
    /// Distance travelled in km.
    pub distance_km: f64,
    /// Emission in kg CO2e.
    pub emission_kg: f64,
    /// Vehicle used.
    pub vehicle: Vehicle,
}

impl TripRecord {
    /// Create a validated trip with a fresh id.
    pub fn new(
        timestamp: DateTime<Utc>,
        distance_km: f64,
        emission_kg: f64,
        vehicle: Vehicle,
    ) -> Result<Self> {
        Self::with_id(
            uuid::Uuid::new_v4().to_string(),
            timestamp,
            distance_km,
            emission_kg,
            vehicle,
        )
    }

    /// Create a validated trip with an explicit id.
    pub fn with_id(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        distance_km: f64,
        emission_kg: f64,
        vehicle: Vehicle,
    ) -> Result<Self> {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Err(FootprintError::invalid_record(
                "distance_km",
                format!("must be a finite value greater than zero (got {distance_km})"),
            ));
        }
        if !emission_kg.is_finite() || emission_kg < 0.0 {
            return Err(FootprintError::invalid_record(
                "emission_kg",
                format!("must be a finite, non-negative value (got {emission_kg})"),
            ));
        }

        Ok(Self {
            id: id.into(),
            timestamp,
            distance_km,
            emission_kg,
            vehicle,
        })
    }

    /// Check an already-constructed record (e.g. one deserialized from JSON).
    pub fn validate(&self) -> Result<()> {
        Self::with_id(
            self.id.clone(),
            self.timestamp,
            self.distance_km,
            self.emission_kg,
            self.vehicle.clone(),
        )
        .map(|_| ())
    }

    /// Calendar-day key (UTC date portion of the timestamp).
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Weekday the trip started on.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.timestamp.weekday()
    }

    /// Whether the trip happened on a Saturday or Sunday.
    #[must_use]
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

/// Short English label for a weekday ("Mon".."Sun").
#[must_use]
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_vehicle_parse_base_categories() {
        assert_eq!(Vehicle::parse("car"), Vehicle::Car);
        assert_eq!(Vehicle::parse(" BUS "), Vehicle::Bus);
        assert_eq!(Vehicle::parse("Bicycle"), Vehicle::Bike);
        assert_eq!(Vehicle::parse("walk"), Vehicle::Walking);
    }

    #[test]
    fn test_vehicle_custom_label_is_distinct() {
        let scooter = Vehicle::parse("E-Scooter");
        assert!(scooter.is_custom());
        assert_eq!(scooter.label(), "E-Scooter");
        assert_ne!(scooter, Vehicle::Bike);
        assert_eq!(Vehicle::parse("").label(), "Unknown");
    }

    #[test]
    fn test_custom_vehicle_keeps_base_like_names() {
        let custom = Vehicle::custom("car");
        assert_eq!(custom, Vehicle::Custom("car".to_string()));
        assert_ne!(custom, Vehicle::Car);
        assert!(Vehicle::custom(" Bicycle ").is_custom());
        assert_eq!(Vehicle::custom("  ").label(), "Unknown");
    }

    #[test]
    fn test_labels_decode_exactly() {
        for base in Vehicle::BASE {
            assert_eq!(Vehicle::from_label(base.label()), base);
        }
        assert_eq!(Vehicle::from_label("car"), Vehicle::Custom("car".to_string()));
        assert_eq!(Vehicle::from_label("Bicycle"), Vehicle::Custom("Bicycle".to_string()));

        let json = serde_json::to_string(&Vehicle::custom("bike")).unwrap();
        let back: Vehicle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Vehicle::Custom("bike".to_string()));
    }

    #[test]
    fn test_vehicle_serde_as_label() {
        let json = serde_json::to_string(&Vehicle::Train).unwrap();
        assert_eq!(json, "\"Train\"");
        let parsed: Vehicle = serde_json::from_str("\"Tuk-tuk\"").unwrap();
        assert_eq!(parsed, Vehicle::Custom("Tuk-tuk".to_string()));
    }

    #[test]
    fn test_trip_rejects_non_positive_distance() {
        let err = TripRecord::new(at(2025, 3, 3), 0.0, 1.0, Vehicle::Car).unwrap_err();
        assert!(matches!(err, FootprintError::InvalidRecord { ref field, .. } if field == "distance_km"));

        assert!(TripRecord::new(at(2025, 3, 3), -4.0, 1.0, Vehicle::Car).is_err());
        assert!(TripRecord::new(at(2025, 3, 3), f64::NAN, 1.0, Vehicle::Car).is_err());
    }

    #[test]
    fn test_trip_rejects_negative_emission_but_allows_zero() {
        assert!(TripRecord::new(at(2025, 3, 3), 3.0, -0.1, Vehicle::Bike).is_err());
        let trip = TripRecord::new(at(2025, 3, 3), 3.0, 0.0, Vehicle::Bike).unwrap();
        assert_eq!(trip.emission_kg, 0.0);
    }

    #[test]
    fn test_trip_calendar_helpers() {
        // 2025-03-08 is a Saturday
        let trip = TripRecord::new(at(2025, 3, 8), 10.0, 2.1, Vehicle::Car).unwrap();
        assert_eq!(trip.day(), NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());
        assert_eq!(trip.weekday(), Weekday::Sat);
        assert!(trip.is_weekend());
        assert_eq!(weekday_label(trip.weekday()), "Sat");
    }
}
