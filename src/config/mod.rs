//! Configuration management for footprint-insight.
//!
//! Handles:
//! - Analysis constants (smoothing, thresholds, window, grid intensity)
//! - The cluster archetype catalog
//! - Confidence weights and caps
//! - Recommendation generator and record store settings
//!
//! The global file lives under the platform config directory. A
//! `.footprint.toml` in the working directory is layered on top of it,
//! key by key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FootprintError, Result};
use crate::model::{ClusterArchetype, Vehicle};
use crate::util::atomic_write;

/// Project-specific configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = ".footprint.toml";

/// Default grid emission intensity, kg CO2e per kWh.
pub const DEFAULT_GRID_INTENSITY: f64 = 0.45;

/// Alternate grid emission intensity, kg CO2e per kWh.
///
/// Bill emissions have been computed with both this value and
/// [`DEFAULT_GRID_INTENSITY`]. Which one is correct for a given region is
/// a product decision; set `analysis.grid_intensity` to choose.
pub const ALTERNATE_GRID_INTENSITY: f64 = 0.710;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Analytics constants.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Recommendation generator settings.
    #[serde(default)]
    pub recommendations: RecommendationConfig,
    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration with project-specific overrides.
    ///
    /// Keys present in `.footprint.toml` inside `project_dir` replace the
    /// matching keys of the global file. Tables are merged recursively,
    /// arrays (the cluster catalog) are replaced whole.
    pub fn load_for_project(project_dir: &Path) -> Result<Self> {
        let mut merged = match default_config_path() {
            Ok(path) if path.exists() => read_table(&path)?,
            _ => toml::Table::new(),
        };

        let project_config_path = project_dir.join(PROJECT_CONFIG_FILENAME);
        if project_config_path.exists() {
            let overlay = read_table(&project_config_path)?;
            merge_tables(&mut merged, overlay);
        }

        let config: Self = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| FootprintError::InvalidConfig {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootprintError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| FootprintError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        if self.recommendations.timeout_ms == 0 {
            return Err(invalid("recommendations.timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    ///
    /// Writes to a temporary file first, then renames it over the target.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| FootprintError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        atomic_write(path, content.as_bytes())?;

        Ok(())
    }

    /// Read a single value by dotted key (e.g. `analysis.smoothing_alpha`).
    pub fn get(&self, key: &str) -> Result<toml::Value> {
        let mut current = toml::Value::try_from(self).map_err(|e| FootprintError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        for part in key.split('.') {
            current = match current {
                toml::Value::Table(mut table) => table.remove(part).ok_or_else(|| unknown_key(key))?,
                _ => return Err(unknown_key(key)),
            };
        }
        Ok(current)
    }

    /// Set a single value by dotted key, parsing `raw` as a TOML value.
    ///
    /// Bare words that are not valid TOML are stored as strings.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let value = parse_value(raw);
        let mut root = toml::Value::try_from(&*self).map_err(|e| FootprintError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        let parts: Vec<&str> = key.split('.').collect();
        let (last, parents) = parts.split_last().ok_or_else(|| unknown_key(key))?;
        let mut cursor = &mut root;
        for part in parents {
            cursor = match cursor {
                toml::Value::Table(table) => table.get_mut(*part).ok_or_else(|| unknown_key(key))?,
                _ => return Err(unknown_key(key)),
            };
        }
        match cursor {
            toml::Value::Table(table) => {
                // Optional keys (endpoint, database) are absent from the
                // serialized form until set.
                table.insert((*last).to_string(), value);
            }
            _ => return Err(unknown_key(key)),
        }

        let updated: Self = root.try_into().map_err(|e: toml::de::Error| FootprintError::InvalidConfig {
            message: format!("{key}: {e}"),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

/// Every overridable analytics constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// EWMA smoothing factor, in (0, 1].
    pub smoothing_alpha: f64,
    /// Absolute slope above which a trend counts as increasing/decreasing.
    pub trend_threshold: f64,
    /// Relative weekday/weekend gap that counts as a seasonal pattern.
    pub seasonal_threshold: f64,
    /// Minimum daily points before seasonal strength feeds the forecast and confidence.
    pub seasonal_min_days: usize,
    /// Trailing window length in days.
    pub window_days: u32,
    /// Grid emission intensity, kg CO2e per kWh.
    pub grid_intensity: f64,
    /// Days a bill is spread over.
    pub billing_days: f64,
    /// Optimized target as a fraction of the forecast.
    pub reduction_factor: f64,
    /// Weekly forecasts below this are Low risk.
    pub risk_low_max: f64,
    /// Weekly forecasts below this (and not Low) are Moderate risk.
    pub risk_moderate_max: f64,
    /// Regional reference average, kg CO2e per day.
    pub regional_daily_average: f64,
    /// Trips at or above this distance are long.
    pub long_trip_km: f64,
    /// Trips below this distance are short.
    pub short_trip_km: f64,
    /// Long-trip share above which `frequent_long_trips` is raised.
    pub long_trip_share: f64,
    /// Energy/travel ratio above which energy dominates.
    pub energy_dominance_ratio: f64,
    /// Energy/travel ratio below which travel dominates.
    pub travel_dominance_ratio: f64,
    /// Lower bound on the travel denominator of the ratio.
    pub min_travel_denominator: f64,
    /// Number of peak weekdays to report.
    pub peak_day_count: usize,
    /// Ordered cluster archetype catalog.
    pub clusters: Vec<ClusterArchetype>,
    /// Confidence weights and caps.
    pub confidence: ConfidenceConfig,
    /// Per-vehicle emission factors.
    pub emission_factors: EmissionFactors,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.3,
            trend_threshold: 0.1,
            seasonal_threshold: 0.2,
            seasonal_min_days: 7,
            window_days: 30,
            grid_intensity: DEFAULT_GRID_INTENSITY,
            billing_days: 30.0,
            reduction_factor: 0.8,
            risk_low_max: 15.0,
            risk_moderate_max: 30.0,
            regional_daily_average: 12.0,
            long_trip_km: 20.0,
            short_trip_km: 5.0,
            long_trip_share: 0.3,
            energy_dominance_ratio: 2.0,
            travel_dominance_ratio: 0.5,
            min_travel_denominator: 0.1,
            peak_day_count: 2,
            clusters: default_clusters(),
            confidence: ConfidenceConfig::default(),
            emission_factors: EmissionFactors::default(),
        }
    }
}

impl AnalysisConfig {
    /// Reject values the analytics core cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(invalid(format!(
                "analysis.smoothing_alpha must be in (0, 1] (got {})",
                self.smoothing_alpha
            )));
        }
        if self.window_days == 0 {
            return Err(invalid("analysis.window_days must be greater than zero"));
        }
        if !(self.billing_days > 0.0) {
            return Err(invalid("analysis.billing_days must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.reduction_factor) {
            return Err(invalid(format!(
                "analysis.reduction_factor must be in [0, 1] (got {})",
                self.reduction_factor
            )));
        }
        if self.risk_low_max > self.risk_moderate_max {
            return Err(invalid(
                "analysis.risk_low_max must not exceed analysis.risk_moderate_max",
            ));
        }
        if self.short_trip_km > self.long_trip_km {
            return Err(invalid("analysis.short_trip_km must not exceed analysis.long_trip_km"));
        }
        if !(self.grid_intensity >= 0.0) || !self.grid_intensity.is_finite() {
            return Err(invalid("analysis.grid_intensity must be a finite, non-negative value"));
        }
        if !(self.min_travel_denominator > 0.0) {
            return Err(invalid("analysis.min_travel_denominator must be greater than zero"));
        }
        if self.clusters.is_empty() {
            return Err(invalid("analysis.clusters must contain at least one archetype"));
        }
        self.confidence.validate()
    }
}

/// Weights and normalization caps of the confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Weight of day coverage.
    pub coverage_weight: f64,
    /// Weight of trip volume.
    pub volume_weight: f64,
    /// Weight of trend stability.
    pub stability_weight: f64,
    /// Weight of low variability.
    pub variability_weight: f64,
    /// Weight of seasonal strength.
    pub seasonality_weight: f64,
    /// Weight of recency.
    pub recency_weight: f64,
    /// Bonus when any bill exists.
    pub bills_weight: f64,
    /// Distinct days for full coverage.
    pub coverage_days: f64,
    /// Windowed trips for full volume.
    pub volume_trips: f64,
    /// Absolute slope at which stability reaches zero.
    pub slope_cap: f64,
    /// Coefficient of variation at which variability reaches zero.
    pub cov_cap: f64,
    /// Seasonal strength for full seasonality.
    pub seasonal_strength_cap: f64,
    /// Days since the last trip at which recency reaches zero.
    pub recency_days: f64,
    /// Lowest reported confidence.
    pub floor: f64,
    /// Highest reported confidence.
    pub ceiling: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            coverage_weight: 30.0,
            volume_weight: 15.0,
            stability_weight: 15.0,
            variability_weight: 15.0,
            seasonality_weight: 10.0,
            recency_weight: 10.0,
            bills_weight: 5.0,
            coverage_days: 30.0,
            volume_trips: 20.0,
            slope_cap: 0.5,
            cov_cap: 1.5,
            seasonal_strength_cap: 0.5,
            recency_days: 14.0,
            floor: 5.0,
            ceiling: 95.0,
        }
    }
}

impl ConfidenceConfig {
    fn validate(&self) -> Result<()> {
        if self.floor > self.ceiling {
            return Err(invalid(format!(
                "analysis.confidence.floor ({}) exceeds ceiling ({})",
                self.floor, self.ceiling
            )));
        }
        let caps = [
            ("coverage_days", self.coverage_days),
            ("volume_trips", self.volume_trips),
            ("slope_cap", self.slope_cap),
            ("cov_cap", self.cov_cap),
            ("seasonal_strength_cap", self.seasonal_strength_cap),
            ("recency_days", self.recency_days),
        ];
        for (name, cap) in caps {
            if !(cap > 0.0) {
                return Err(invalid(format!("analysis.confidence.{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}

/// Emission factors in kg CO2e per km, used when a trip is logged without
/// an explicit emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionFactors {
    /// Car.
    pub car: f64,
    /// Bus.
    pub bus: f64,
    /// Train.
    pub train: f64,
    /// Bike.
    pub bike: f64,
    /// Walking.
    pub walking: f64,
    /// Any custom vehicle.
    pub custom: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            car: 0.21,
            bus: 0.089,
            train: 0.041,
            bike: 0.0,
            walking: 0.0,
            custom: 0.15,
        }
    }
}

impl EmissionFactors {
    /// Factor for a vehicle.
    #[must_use]
    pub fn factor(&self, vehicle: &Vehicle) -> f64 {
        match vehicle {
            Vehicle::Car => self.car,
            Vehicle::Bus => self.bus,
            Vehicle::Train => self.train,
            Vehicle::Bike => self.bike,
            Vehicle::Walking => self.walking,
            Vehicle::Custom(_) => self.custom,
        }
    }

    /// Estimated emission for a trip.
    #[must_use]
    pub fn estimate(&self, vehicle: &Vehicle, distance_km: f64) -> f64 {
        self.factor(vehicle) * distance_km
    }
}

/// Recommendation generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Ask the external generator at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// HTTP endpoint of the external generator.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Timeout for the external call in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path (platform data dir when unset).
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// User id used when `--user` is not given.
    #[serde(default = "default_user")]
    pub default_user: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: None,
            default_user: default_user(),
        }
    }
}

impl StoreConfig {
    /// Resolve the database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => default_database_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_user() -> String {
    "default".to_string()
}

/// The six built-in archetypes, in tie-breaking order.
#[must_use]
pub fn default_clusters() -> Vec<ClusterArchetype> {
    vec![
        ClusterArchetype::new("Minimal Footprint", 0.3, 0.5),
        ClusterArchetype::new("Eco Commuter", 1.0, 2.0),
        ClusterArchetype::new("Balanced Household", 4.0, 4.0),
        ClusterArchetype::new("Energy-Heavy Home", 2.0, 9.0),
        ClusterArchetype::new("Road Warrior", 10.0, 3.0),
        ClusterArchetype::new("High-Impact Lifestyle", 10.0, 10.0),
    ]
}

fn invalid(message: impl Into<String>) -> FootprintError {
    FootprintError::InvalidConfig {
        message: message.into(),
    }
}

fn unknown_key(key: &str) -> FootprintError {
    FootprintError::ConfigError {
        message: format!("Unknown configuration key: {key}"),
    }
}

fn parse_value(raw: &str) -> toml::Value {
    let wrapped = format!("value = {raw}");
    match wrapped.parse::<toml::Table>() {
        Ok(mut table) => table
            .remove("value")
            .unwrap_or_else(|| toml::Value::String(raw.to_string())),
        Err(_) => toml::Value::String(raw.to_string()),
    }
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FootprintError::io(format!("Failed to read config file: {}", path.display()), e)
    })?;
    content.parse::<toml::Table>().map_err(|e| FootprintError::InvalidConfig {
        message: format!("{}: {e}", path.display()),
    })
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| FootprintError::Unsupported {
        feature: "config directory discovery".to_string(),
    })?;

    Ok(config_dir.join("footprint").join("config.toml"))
}

/// Get the default database path.
pub fn default_database_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| FootprintError::Unsupported {
        feature: "data directory discovery".to_string(),
    })?;

    Ok(data_dir.join("footprint").join("records.db"))
}
