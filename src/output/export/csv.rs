//! CSV export of simulation statistics
//!
//! Writes the per-species average, minimum and maximum concentration of every
//! compartment over time, one row per time point. The output opens directly
//! in spreadsheets, pandas or MATLAB.
//!
//! # Quick Examples
//!
//! ```rust,ignore
//! use pixsim_rs::output::export::{CsvExporter, Exporter};
//!
//! // All time points, default format
//! CsvExporter::default().export(sim.result(), None, "stats.csv")?;
//! ```
//!
//! **Output** (`stats.csv`):
//! ```csv
//! time,c2/A_c2 avg,c2/A_c2 min,c2/A_c2 max
//! 0.000000,0.000000,0.000000,0.000000
//! 1.000000,0.091393,0.091393,0.091393
//! ```
//!
//! With metadata, the header is preceded by `#` comment lines:
//!
//! ```csv
//! # Pixel Reaction-Diffusion Simulation Data
//! # Generated: 2026-02-11T15:30:00Z
//! # Model: very-simple
//! # Simulator: Pixel
//! #
//! time,...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};

use thiserror::Error;

use crate::solver::SimulationResult;

use super::Exporter;

// =============================================================================
// Errors
// =============================================================================

/// CSV export failure
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("empty data: {0}")]
    Empty(String),

    #[error("data length mismatch: {0}")]
    LengthMismatch(String),

    #[error("invalid data: NaN or Inf detected in {0}")]
    NonFinite(String),

    #[error("no species {species} in compartment {compartment}")]
    UnknownSpecies { compartment: usize, species: usize },

    #[error("cannot write CSV file: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Configuration Structures
// =============================================================================

/// Configuration for CSV export
///
/// # Example
///
/// ```rust
/// use pixsim_rs::output::export::CsvConfig;
///
/// let config = CsvConfig {
///     delimiter: ';',
///     precision: 10,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Number of decimal places for floating-point values (default: 6)
    pub precision: usize,

    /// Include metadata header comments (default: false)
    pub include_metadata: bool,

    /// Metadata to include in header
    pub metadata: Option<CsvMetadata>,

    /// Header of the time column (default: "time")
    pub time_header: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            include_metadata: false,
            metadata: None,
            time_header: "time".to_string(),
        }
    }
}

impl CsvConfig {
    /// European CSV format (semicolon, comma for decimal)
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    /// High precision (12 decimal places)
    pub fn high_precision() -> Self {
        Self {
            precision: 12,
            ..Default::default()
        }
    }

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

    /// Check that delimiter and decimal separator cannot be confused
    pub fn validate(&self) -> Result<(), String> {
        if self.delimiter == self.decimal_separator {
            return Err(format!(
                "Delimiter and decimal separator must differ, both are '{}'",
                self.delimiter
            ));
        }
        if self.precision > 17 {
            return Err(format!("Precision {} exceeds f64 resolution (17)", self.precision));
        }
        Ok(())
    }
}

/// Metadata for CSV header comments
///
/// Only fields that are set end up in the header.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    pub model_name: Option<String>,
    pub simulator_name: Option<String>,
    pub backend: Option<String>,
    /// Final simulation time
    pub total_time: Option<f64>,
    pub time_points: Option<usize>,
    /// Additional custom parameters
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Collect metadata recorded in a simulation result
    pub fn from_result(result: &SimulationResult) -> Self {
        Self {
            model_name: result.metadata("model").map(str::to_string),
            simulator_name: result.metadata("simulator").map(str::to_string),
            backend: result.metadata("backend").map(str::to_string),
            total_time: result.time_points().last().copied(),
            time_points: Some(result.len()),
            custom: Vec::new(),
        }
    }

    /// Add custom parameter
    pub fn add_custom(&mut self, key: &str, value: &str) {
        self.custom.push((key.to_string(), value.to_string()));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn write_metadata_header<W: Write>(out: &mut W, metadata: &CsvMetadata) -> std::io::Result<()> {
    writeln!(out, "# Pixel Reaction-Diffusion Simulation Data")?;
    writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;

    if let Some(model) = &metadata.model_name {
        writeln!(out, "# Model: {}", model)?;
    }
    if let Some(simulator) = &metadata.simulator_name {
        writeln!(out, "# Simulator: {}", simulator)?;
    }
    if let Some(backend) = &metadata.backend {
        writeln!(out, "# Math backend: {}", backend)?;
    }
    if let Some(total_time) = metadata.total_time {
        writeln!(out, "# Total Time: {}", total_time)?;
    }
    if let Some(time_points) = metadata.time_points {
        writeln!(out, "# Time Points: {}", time_points)?;
    }
    for (key, value) in &metadata.custom {
        writeln!(out, "# {}: {}", key, value)?;
    }
    writeln!(out, "#")
}

/// Format number with configured precision and decimal separator
fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$}", value, prec = config.precision);
    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

/// Indices of `n_points` time points spread uniformly, first and last included
fn sample_indices(len: usize, n_points: Option<usize>) -> Vec<usize> {
    match n_points {
        Some(n) if n >= 2 && n < len => {
            let step = (len - 1) as f64 / (n - 1) as f64;
            let mut indices: Vec<usize> = (0..n).map(|i| (i as f64 * step).round() as usize).collect();
            indices.dedup();
            indices
        }
        Some(1) if len > 0 => vec![len - 1],
        _ => (0..len).collect(),
    }
}

// =============================================================================
// Export Functions
// =============================================================================

/// Export a time column and any number of named value columns
///
/// # Errors
///
/// - Empty data
/// - Mismatched lengths
/// - NaN or Inf values
/// - File creation errors
pub fn export_time_series_csv(
    time_serie: &[f64],
    columns: &[Vec<f64>],
    headers: &[String],
    output_path: &str,
    configuration: Option<&CsvConfig>,
) -> Result<(), CsvError> {
    // ============================= Validation =============================

    if time_serie.is_empty() {
        return Err(CsvError::Empty("time series must not be empty".to_string()));
    }
    if time_serie.iter().any(|t| !t.is_finite()) {
        return Err(CsvError::NonFinite("time series".to_string()));
    }
    if columns.len() != headers.len() {
        return Err(CsvError::LengthMismatch(format!(
            "{} columns versus {} headers",
            columns.len(),
            headers.len()
        )));
    }
    for (column, header) in columns.iter().zip(headers) {
        if column.len() != time_serie.len() {
            return Err(CsvError::LengthMismatch(format!(
                "column '{}' has {} values for {} time points",
                header,
                column.len(),
                time_serie.len()
            )));
        }
        if column.iter().any(|c| !c.is_finite()) {
            return Err(CsvError::NonFinite(format!("column '{}'", header)));
        }
    }

    // ============================= Configuration ==========================

    let binding = CsvConfig::default();
    let configuration = configuration.unwrap_or(&binding);

    // ============================= Write ==================================

    let mut out = BufWriter::new(File::create(output_path)?);

    if configuration.include_metadata
        && let Some(metadata) = &configuration.metadata
    {
        write_metadata_header(&mut out, metadata)?;
    }

    write!(out, "{}", configuration.time_header)?;
    for header in headers {
        write!(out, "{}{}", configuration.delimiter, header)?;
    }
    writeln!(out)?;

    for (i, time) in time_serie.iter().enumerate() {
        write!(out, "{}", format_number(*time, configuration))?;
        for column in columns {
            write!(out, "{}{}", configuration.delimiter, format_number(column[i], configuration))?;
        }
        writeln!(out)?;
    }
    out.flush()?;

    log::debug!("wrote {} rows to {}", time_serie.len(), output_path);
    Ok(())
}

// =============================================================================
// Exporter
// =============================================================================

/// CSV implementation of [`Exporter`]
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    pub config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }
}

impl Exporter for CsvExporter {
    type Error = CsvError;

    fn export(&self, result: &SimulationResult, n_points: Option<usize>, path: &str) -> Result<(), CsvError> {
        if result.is_empty() {
            return Err(CsvError::Empty("simulation result has no time points".to_string()));
        }
        let indices = sample_indices(result.len(), n_points);
        let time: Vec<f64> = indices.iter().map(|&t| result.time_points()[t]).collect();

        let mut headers = Vec::new();
        let mut columns = Vec::new();
        for (c, compartment) in result.compartment_ids().iter().enumerate() {
            for (s, species) in result.species_ids(c).iter().enumerate() {
                let stats: Vec<_> = indices
                    .iter()
                    .map(|&t| result.avg_min_max(t, c, s).unwrap_or_default())
                    .collect();
                headers.push(format!("{}/{} avg", compartment, species));
                columns.push(stats.iter().map(|m| m.avg).collect());
                headers.push(format!("{}/{} min", compartment, species));
                columns.push(stats.iter().map(|m| m.min).collect());
                headers.push(format!("{}/{} max", compartment, species));
                columns.push(stats.iter().map(|m| m.max).collect());
            }
        }

        export_time_series_csv(&time, &columns, &headers, path, Some(&self.config))
    }

    fn export_species(
        &self,
        result: &SimulationResult,
        compartment: usize,
        species: usize,
        n_points: Option<usize>,
        path: &str,
    ) -> Result<(), CsvError> {
        let name = result
            .species_ids(compartment)
            .get(species)
            .ok_or(CsvError::UnknownSpecies { compartment, species })?;
        if result.is_empty() {
            return Err(CsvError::Empty("simulation result has no time points".to_string()));
        }

        let indices = sample_indices(result.len(), n_points);
        let time: Vec<f64> = indices.iter().map(|&t| result.time_points()[t]).collect();
        let avg: Vec<f64> = indices
            .iter()
            .map(|&t| result.avg_min_max(t, compartment, species).map(|m| m.avg).unwrap_or(f64::NAN))
            .collect();

        export_time_series_csv(&time, &[avg], &[name.clone()], path, Some(&self.config))
    }
}

// =================================================================================================
// Tests
// =================================================================================================
