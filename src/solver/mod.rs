//! Numerical solvers
//!
//! This module advances a [`RateModel`](crate::physics::RateModel) in time
//! and records what happened.
//!
//! # Core Concepts
//!
//! 1. **Integrator** ([`Integrator`]) - the numerical method
//!    - Adaptive explicit Runge-Kutta, orders 1 to 4 ([`methods`])
//!    - Configured by [`IntegratorOptions`]
//!    - Independent of physics
//!
//! 2. **Simulator** ([`Simulator`] trait) - one simulation backend
//!    - [`PixelSimulator`]: voxel finite differences, optionally on a
//!      dedicated rayon pool
//!
//! 3. **Simulation** ([`Simulation`]) - the session facade
//!    - Builds the backend from a model and a geometry
//!    - Never fails on `advance`, keeps an error message instead
//!    - Appends a snapshot to the [`SimulationResult`] after every advance
//!
//! # Workflow Diagram
//!
//! ```text
//! ┌──────────────────────┐
//! │ ModelDef + Geometry  │  (what to simulate)
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ PixelModel           │ ← steppers, dy/dt = f(y)
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ Integrator           │ ← adaptive RK, IntegratorOptions
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ SimulationResult     │ ← time points, snapshots, statistics
//! └──────────────────────┘
//! ```
//!
//! # Quick Start Example
//!
//! ```rust
//! use pixsim_rs::models::library::very_simple_model;
//! use pixsim_rs::physics::MathBackend;
//! use pixsim_rs::solver::{IntegratorOptions, Simulation, SimulatorType};
//!
//! let (model, geometry) = very_simple_model()?;
//! let mut sim = Simulation::new(&model, geometry, SimulatorType::Pixel, MathBackend::Interpreted)?;
//! sim.set_integrator_options(IntegratorOptions { order: 4, ..Default::default() })
//!     .map_err(pixsim_rs::SimulationError::InvalidOptions)?;
//!
//! let steps = sim.advance(1.0);
//! assert!(steps > 0);
//! assert_eq!(sim.time_points().len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Error Handling
//!
//! `advance` returns the number of accepted sub-steps; zero means it failed:
//!
//! ```rust,ignore
//! if sim.advance(10.0) == 0 {
//!     eprintln!("Simulation failed: {}", sim.error_message().unwrap_or_default());
//! }
//! ```
//!
//! Common errors:
//! - Step size driven below the minimum time step
//! - Numerical instability (NaN or Inf in the state)

// =================================================================================================
// Module Declarations
// =================================================================================================
mod integrator;
pub mod methods;
mod pixel;
mod result;
mod simulation;
mod traits;

// =================================================================================================
// Parallel stage combination
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// State length above which stage combinations are split across the pool
///
/// One 128 × 128 single-species field. Smaller states, such as the demo
/// models at their default size, combine faster on one thread.
const DEFAULT_PARALLEL_THRESHOLD: usize = 128 * 128;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// State length above which the integrator combines stages in parallel
///
/// Only consulted with the `parallel` feature and more than one thread.
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Change the threshold for every integrator, `0` to always split
///
/// Results do not depend on it; each state entry is combined the same way
/// on either path.
pub fn set_parallel_threshold(threshold: usize) {
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
    log::debug!("parallel stage combination above {} state entries", threshold);
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use integrator::{Integrator, StepReport};
pub use pixel::PixelSimulator;
pub use result::{AvgMinMax, SimulationResult};
pub use simulation::Simulation;
pub use traits::{IntegratorOptions, MinStepPolicy, Simulator, SimulatorType};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::physics::RateModel;

/// Validate a state vector for numerical issues
///
/// Checks that the state does not contain NaN or Inf values, which would
/// indicate numerical instability or errors in the rate expressions. The
/// message names the offending entry through [`RateModel::locate`].
///
/// ```rust,ignore
/// validate_state(state.as_slice(), &model, 42)?;  // Validates state at step 42
/// ```
pub(crate) fn validate_state<M: RateModel + ?Sized>(state: &[f64], model: &M, step: usize) -> Result<(), String> {
    let Some(index) = state.iter().position(|x| !x.is_finite()) else {
        return Ok(());
    };

    if state[index].is_nan() {
        Err(format!(
            "NaN detected in {} at step {}. This indicates numerical instability. \
             Try a smaller maximum time step or a tighter error tolerance.",
            model.locate(index),
            step
        ))
    } else {
        Err(format!(
            "Infinity detected in {} at step {}. This indicates numerical overflow. \
             Try reducing the time step or check the rate expressions for division by zero.",
            model.locate(index),
            step
        ))
    }
}

// =================================================================================================
// Tests
// =================================================================================================
