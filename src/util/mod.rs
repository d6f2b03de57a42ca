//! Utility functions for common operations.
//!
//! This module provides shared utilities used across the crate:
//! - Atomic file operations for config and export output
//! - Number formatting for reports
//! - Unicode sparklines for small series

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{FootprintError, Result};

/// Atomically write content to a file.
///
/// The content goes to a temporary file in the target's directory, which
/// is then renamed over the target. If any step fails the original file
/// (if it exists) is left unchanged.
///
/// # Example
///
/// ```rust,no_run
/// use footprint_insight::util::atomic_write;
///
/// atomic_write("config.toml", b"[analysis]\nwindow_days = 14\n").unwrap();
/// ```
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let mut atomic = AtomicFile::create(path)?;
    atomic.writer().write_all(content).map_err(|e| {
        FootprintError::io(
            format!("Failed to write to temporary file for: {}", atomic.target().display()),
            e,
        )
    })?;
    atomic.finish()
}

/// A file that replaces its target only when [`AtomicFile::finish`] is called.
///
/// Dropping it without finishing discards the temporary file.
///
/// # Example
///
/// ```rust,no_run
/// use footprint_insight::util::AtomicFile;
/// use std::io::Write;
///
/// let mut atomic = AtomicFile::create("insight.md").unwrap();
/// writeln!(atomic.writer(), "# Weekly insight").unwrap();
/// atomic.finish().unwrap();
/// ```
pub struct AtomicFile {
    temp_file: NamedTempFile,
    target_path: PathBuf,
}

impl AtomicFile {
    /// Create a new atomic file writer for the given target path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let parent = parent_dir(path)?;

        if !parent.exists() {
            std::fs::create_dir_all(&parent).map_err(|e| {
                FootprintError::io(format!("Failed to create directory: {}", parent.display()), e)
            })?;
        }

        // Same directory as the target so the rename stays on one filesystem
        let temp_file = NamedTempFile::new_in(&parent).map_err(|e| {
            FootprintError::io(
                format!("Failed to create temporary file in: {}", parent.display()),
                e,
            )
        })?;

        Ok(Self {
            temp_file,
            target_path: path.to_path_buf(),
        })
    }

    /// Get a mutable reference to the underlying writer.
    pub fn writer(&mut self) -> &mut NamedTempFile {
        &mut self.temp_file
    }

    /// Path the file will be renamed to.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target_path
    }

    /// Flush and rename the temporary file over the target.
    pub fn finish(mut self) -> Result<()> {
        self.temp_file.flush().map_err(|e| {
            FootprintError::io(format!("Failed to flush file: {}", self.target_path.display()), e)
        })?;

        self.temp_file.persist(&self.target_path).map_err(|e| {
            FootprintError::io(
                format!("Failed to atomically write: {}", self.target_path.display()),
                e.error,
            )
        })?;

        Ok(())
    }
}

fn parent_dir(path: &Path) -> Result<PathBuf> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(PathBuf::from(".")),
        Some(parent) => Ok(parent.to_path_buf()),
        None => Err(FootprintError::IoError {
            context: format!("Cannot determine parent directory for: {}", path.display()),
            source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
        }),
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Format a mass in kg CO2e with one decimal ("12.3 kg").
#[must_use]
pub fn format_kg(value: f64) -> String {
    format!("{value:.1} kg")
}

/// Format a percentage with no decimals ("42%").
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.0}%")
}

/// Format a signed slope ("+0.25", "-1.10").
#[must_use]
pub fn format_signed(value: f64) -> String {
    format!("{value:+.2}")
}

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render a series as a Unicode sparkline.
///
/// Constant series render at the lowest level. Non-finite values are
/// treated as zero.
#[must_use]
pub fn sparkline(values: &[f64]) -> String {
    let clean: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();
    let Some(min) = clean.iter().copied().reduce(f64::min) else {
        return String::new();
    };
    let max = clean.iter().copied().fold(min, f64::max);
    let range = max - min;

    clean
        .iter()
        .map(|v| {
            if range <= f64::EPSILON {
                SPARK_LEVELS[0]
            } else {
                let scaled = ((v - min) / range * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
                SPARK_LEVELS[scaled.min(SPARK_LEVELS.len() - 1)]
            }
        })
        .collect()
}
