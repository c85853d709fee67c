//! Visualization of simulation results with `plotters`
//!
//! - **config**: shared plot configuration ([`PlotConfig`])
//! - **timeseries**: average concentration of each species against time
//! - **image**: concentration preview of one z layer
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pixsim_rs::output::visualization::{plot_time_series, save_concentration_image};
//!
//! plot_time_series(sim.result(), None, "averages.png", None)?;
//!
//! // last time point, layer 0, 8x8 screen pixels per voxel
//! let t = sim.time_points().len() - 1;
//! save_concentration_image(sim.result(), t, 0, 8, "final.png")?;
//! ```

pub mod config;
pub mod image;
pub mod timeseries;

pub use config::PlotConfig;
pub use image::save_concentration_image;
pub use timeseries::plot_time_series;
