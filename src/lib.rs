//! footprint-insight: personal carbon footprint tracking with weekly forecasts.
//!
//! Users log trips and utility bills. From a snapshot of those records the
//! crate derives a weekly emission forecast, a behavioral archetype, trip
//! patterns, anomaly flags, a confidence score and three recommendations.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use footprint_insight::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> footprint_insight::Result<()> {
//!     let store = RecordStore::open_in_memory()?;
//!     let trip = TripRecord::new(Utc::now(), 12.0, 2.5, Vehicle::Car)?;
//!     store.add_trip("alice", &trip)?;
//!
//!     let engine = InsightEngine::local(Config::default());
//!     let insight = engine.generate(&store.snapshot("alice")?, Utc::now()).await;
//!     println!("{} kg next week ({})", insight.weekly_forecast, insight.risk_tier);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`model`]: records and the insight value types
//! - [`analytics`]: the pure, synchronous analytics core
//! - [`recommend`]: recommendation generators and the local fallback
//! - [`insight`]: the insight assembler
//! - [`store`]: SQLite record store
//! - [`export`]: text, Markdown, JSON and CSV renderers plus JSON Schema
//! - [`config`]: TOML configuration
//! - [`cli`]: command-line interface
//! - [`error`]: error types and exit codes

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod analytics;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod insight;
pub mod model;
pub mod recommend;
pub mod store;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{FootprintError, Result};
pub use insight::InsightEngine;
pub use model::{Insight, RecordSnapshot, TripRecord, UtilityBillRecord, Vehicle};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analytics::{analyze_snapshot, Analysis};
    pub use crate::config::{AnalysisConfig, Config};
    pub use crate::error::{FootprintError, Result};
    pub use crate::export::{export_to_string, ExportFormat, ExportOptions};
    pub use crate::insight::InsightEngine;
    pub use crate::model::{
        Insight, RecordSnapshot, RecommendationSource, RiskTier, TripRecord, UtilityBillRecord,
        Vehicle,
    };
    pub use crate::recommend::{RecommendationContext, RecommendationGenerator};
    pub use crate::store::RecordStore;
}
