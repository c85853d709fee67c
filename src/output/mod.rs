//! Output of simulation results
//!
//! - **Visualization**: PNG/SVG plots and preview images using plotters
//! - **Export**: CSV data export for external analysis
//!
//! ```text
//! output/
//! ├── visualization/
//! │   ├── config.rs
//! │   ├── timeseries.rs
//! │   └── image.rs
//! └── export/
//!     └── csv.rs
//! ```

pub mod export;
pub mod visualization;

pub use export::{CsvConfig, CsvExporter, Exporter};
pub use visualization::{plot_time_series, save_concentration_image, PlotConfig};
