//! Export of simulation results to files.
//!
//! The [`Exporter`] trait abstracts the export format; each format lives in
//! its own sub-module.
//!
//! | Format  | Module  |
//! |---------|---------|
//! | CSV     | [`csv`] |
//!
//! # Usage example
//!
//! ```rust,ignore
//! use pixsim_rs::output::export::{CsvExporter, Exporter};
//!
//! let exporter = CsvExporter::default();
//!
//! // Statistics of every species, all time points
//! exporter.export(sim.result(), None, "stats.csv")?;
//!
//! // Average of one species, downsampled to 50 points
//! exporter.export_species(sim.result(), 1, 0, Some(50), "A_c2.csv")?;
//! ```

pub mod csv;

pub use csv::{export_time_series_csv, CsvConfig, CsvError, CsvExporter, CsvMetadata};

use crate::solver::SimulationResult;

/// Abstraction trait for all export formats.
///
/// # Parameter `n_points`
///
/// - `None`: exports all time points
/// - `Some(n)`: uniformly downsamples to `n` points, always keeping the
///   first and last
pub trait Exporter {
    /// Error type specific to this export format.
    type Error: std::error::Error;

    /// Exports average, minimum and maximum of every species of every
    /// compartment.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written or `result` holds no
    /// time points.
    fn export(&self, result: &SimulationResult, n_points: Option<usize>, path: &str) -> Result<(), Self::Error>;

    /// Exports the spatial average of a single species.
    fn export_species(
        &self,
        result: &SimulationResult,
        compartment: usize,
        species: usize,
        n_points: Option<usize>,
        path: &str,
    ) -> Result<(), Self::Error>;
}
