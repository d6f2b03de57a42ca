//! Data model for trips, bills and insights.
//!
//! Trips and bills are the raw records owned by the record store. The
//! analytics core only ever sees them through a [`RecordSnapshot`], an
//! owned copy captured once per analysis pass.

pub mod bill;
pub mod insight;
pub mod trip;

pub use bill::*;
pub use insight::*;
pub use trip::*;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// In-memory snapshot of one user's records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    /// Trips, in store order.
    #[serde(default)]
    pub trips: Vec<TripRecord>,
    /// Utility bills, in store order.
    #[serde(default)]
    pub bills: Vec<UtilityBillRecord>,
}

impl RecordSnapshot {
    /// Create a snapshot from owned records.
    #[must_use]
    pub fn new(trips: Vec<TripRecord>, bills: Vec<UtilityBillRecord>) -> Self {
        Self { trips, bills }
    }

    /// The most recently dated bill (later entries win ties).
    #[must_use]
    pub fn latest_bill(&self) -> Option<&UtilityBillRecord> {
        self.bills.iter().max_by_key(|bill| bill.timestamp)
    }

    /// Validate every record in the snapshot.
    pub fn validate(&self) -> Result<()> {
        for trip in &self.trips {
            trip.validate()?;
        }
        for bill in &self.bills {
            bill.validate()?;
        }
        Ok(())
    }

    /// Check whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty() && self.bills.is_empty()
    }
}
