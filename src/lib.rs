//! pixsim-rs: Pixel Reaction-Diffusion Simulation
//!
//! Simulates how the concentrations of chemical species evolve on a
//! segmented 2D or 3D voxel geometry. Species live in compartments and
//! diffuse between face-neighbouring pixels; reactions happen inside
//! compartments and across the membranes between them.
//!
//! # Architecture
//!
//! pixsim-rs is built on two core principles:
//!
//! 1. **Separation of Physics and Numerics**
//!    - Models and steppers define the equations (what to solve)
//!    - The adaptive Runge-Kutta integrator provides the method (how to solve)
//!
//! 2. **Deterministic parallelism**
//!    - Compartments and membranes are evaluated in parallel fork-join phases
//!    - Results are bit-identical whatever the thread count
//!
//! # Quick Start
//!
//! ```rust
//! use pixsim_rs::prelude::*;
//! use pixsim_rs::models::library::very_simple_model;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 1. Model and geometry
//! let (model, geometry) = very_simple_model()?;
//!
//! // 2. Build the simulation
//! let mut sim = Simulation::new(&model, geometry, SimulatorType::Pixel, MathBackend::Interpreted)?;
//!
//! // 3. Run
//! for _ in 0..10 {
//!     sim.advance(1.0);
//! }
//!
//! // 4. Access results
//! let stats = sim.avg_min_max(10, 1, 0).unwrap();
//! println!("A_c2 at t = 10: {}", stats.avg);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`geometry`]: voxel geometry, compartments and membranes
//! - [`models`]: model definitions and demo models
//! - [`physics`]: expressions, reaction sets, diffusion, steppers
//! - [`solver`]: integrator, simulators, results
//! - [`output`]: CSV export and plots

pub mod error;
pub mod geometry;
pub mod models;
pub mod output;
pub mod physics;
pub mod solver;

pub use error::{ModelError, SimulationError};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use pixsim_rs::prelude::*;
    //! ```
    pub use crate::error::{ModelError, SimulationError};
    pub use crate::geometry::{Geometry, Voxel};
    pub use crate::models::{ModelDef, ReactionDef, SpeciesDef};
    pub use crate::physics::{MathBackend, PixelModel, RateModel};
    pub use crate::solver::{
        IntegratorOptions,
        MinStepPolicy,
        Simulation,
        SimulationResult,
        SimulatorType,
    };
}
