//! CSV export of scalar time series
//!
//! Exports `(time, value)` series — maximum slip velocity, state at a
//! probe node — to CSV for Excel, pandas or MATLAB. The format is
//! deliberately plain: an optional `#`-prefixed metadata header, one
//! header row, one row per recorded step.
//!
//! # Quick Example
//!
//! ```rust,ignore
//! use quake_rs::output::export::export_series_csv;
//!
//! let time = vec![0.0, 1.0, 2.0];
//! let v_max = vec![1e-9, 2e-9, 1.5e-9];
//! export_series_csv(&time, &v_max, "vmax.csv", None)?;
//! ```
//!
//! **Output** (`vmax.csv`):
//! ```csv
//! Time (s),Max slip velocity (m/s)
//! 0.000000e0,1.000000e-9
//! 1.000000e0,2.000000e-9
//! 2.000000e0,1.500000e-9
//! ```

use std::error::Error;
use std::fs::File;
use std::io::Write;

// =================================================================================================
// Configuration
// =================================================================================================

/// Configuration for CSV export
#[derive(Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,
    /// Number of significant digits (default: 6)
    pub precision: usize,
    /// Include metadata header comments (default: false)
    pub include_metadata: bool,
    /// Metadata to include in the header
    pub metadata: Option<CsvMetadata>,
    /// Header for the time column (default: "Time (s)")
    pub time_header: String,
    /// Header for the value column (default: "Max slip velocity (m/s)")
    pub value_header: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            precision: 6,
            include_metadata: false,
            metadata: None,
            time_header: "Time (s)".to_string(),
            value_header: "Max slip velocity (m/s)".to_string(),
        }
    }
}

impl CsvConfig {
    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: set precision
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder pattern: enable metadata
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Metadata for CSV header comments
///
/// All fields are optional; only present fields are written.
#[derive(Clone, Default)]
pub struct CsvMetadata {
    /// Model name
    pub model_name: Option<String>,
    /// Integrator name
    pub solver_name: Option<String>,
    /// Final simulated time (s)
    pub final_time: Option<f64>,
    /// Accepted steps
    pub steps: Option<usize>,
}

// =================================================================================================
// Export
// =================================================================================================

/// Export one scalar time series to CSV
///
/// # Errors
///
/// Fails on empty input, mismatched lengths, NaN values, or I/O errors.
pub fn export_series_csv(
    time: &[f64],
    values: &[f64],
    path: &str,
    config: Option<&CsvConfig>,
) -> Result<(), Box<dyn Error>> {
    let default_config = CsvConfig::default();
    let config = config.unwrap_or(&default_config);

    if time.is_empty() {
        return Err("cannot export an empty time series".into());
    }
    if time.len() != values.len() {
        return Err(format!(
            "time ({}) and value ({}) series have mismatched lengths",
            time.len(),
            values.len()
        )
        .into());
    }
    if values.iter().any(|v| v.is_nan()) || time.iter().any(|t| t.is_nan()) {
        return Err("series contains NaN values".into());
    }

    let mut file = File::create(path)?;

    if config.include_metadata {
        if let Some(metadata) = &config.metadata {
            writeln!(file, "# quake-rs simulation data")?;
            if let Some(model) = &metadata.model_name {
                writeln!(file, "# Model: {}", model)?;
            }
            if let Some(solver) = &metadata.solver_name {
                writeln!(file, "# Solver: {}", solver)?;
            }
            if let Some(final_time) = metadata.final_time {
                writeln!(file, "# Final time: {:e} s", final_time)?;
            }
            if let Some(steps) = metadata.steps {
                writeln!(file, "# Steps: {}", steps)?;
            }
            writeln!(file, "#")?;
        }
    }

    writeln!(
        file,
        "{}{}{}",
        config.time_header, config.delimiter, config.value_header
    )?;
    for (t, v) in time.iter().zip(values.iter()) {
        writeln!(
            file,
            "{:.prec$e}{}{:.prec$e}",
            t,
            config.delimiter,
            v,
            prec = config.precision
        )?;
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
