//! Utility bill records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FootprintError, Result};

/// An electricity bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityBillRecord {
    /// Unique record id.
    pub id: String,
    /// When the bill was issued.
    pub timestamp: DateTime<Utc>,
    /// Billing period label (e.g. "2025-03").
    pub period: String,
    /// Consumption in kWh.
    pub units_kwh: f64,
    /// Emission derived from consumption, kg CO2e.
    pub emission_kg: f64,
}

impl UtilityBillRecord {
    /// Create a validated bill, deriving its emission from a grid intensity.
    pub fn from_consumption(
        timestamp: DateTime<Utc>,
        period: impl Into<String>,
        units_kwh: f64,
        grid_intensity: f64,
    ) -> Result<Self> {
        Self::with_id(
            uuid::Uuid::new_v4().to_string(),
            timestamp,
            period,
            units_kwh,
            units_kwh * grid_intensity,
        )
    }

    /// Create a validated bill with an explicit id and emission.
    pub fn with_id(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        period: impl Into<String>,
        units_kwh: f64,
        emission_kg: f64,
    ) -> Result<Self> {
        if !units_kwh.is_finite() || units_kwh <= 0.0 {
            return Err(FootprintError::invalid_record(
                "units_kwh",
                format!("must be a finite value greater than zero (got {units_kwh})"),
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
            period: period.into(),
            units_kwh,
            emission_kg,
        })
    }

    /// Check an already-constructed record.
    pub fn validate(&self) -> Result<()> {
        Self::with_id(
            self.id.clone(),
            self.timestamp,
            self.period.clone(),
            self.units_kwh,
            self.emission_kg,
        )
        .map(|_| ())
    }
}
