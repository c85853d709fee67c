//! Reaction-diffusion physics
//!
//! This module turns a [`ModelDef`](crate::models::ModelDef) on a
//! [`Geometry`](crate::geometry::Geometry) into the right-hand side of an ODE
//! system. It knows nothing about time stepping.
//!
//! # Core Concepts
//!
//! - **Expression**: a scalar rate law compiled against named variables and
//!   constants ([`ExprEval`], selectable [`MathBackend`])
//! - **Reaction set**: the net rate of every species of one region
//!   ([`ReactionSet`])
//! - **Steppers**: per-compartment diffusion and reactions
//!   ([`CompartmentStepper`]) and per-membrane reactions ([`MembraneStepper`])
//! - **Rate model**: the assembled `dy/dt = f(y)` ([`PixelModel`], any
//!   [`RateModel`])
//!
//! # Architecture
//!
//! Physical models are **separate from numerical solvers**:
//! - The model provides the **equations** (physics)
//! - The solver provides the **method** to solve them (numerics)
//!
//! # Example
//!
//! ```rust
//! use pixsim_rs::models::library::very_simple_model;
//! use pixsim_rs::physics::{MathBackend, PixelModel, RateModel};
//!
//! let (model, geometry) = very_simple_model()?;
//! let mut pixels = PixelModel::new(&model, &geometry, MathBackend::Interpreted)?;
//!
//! let state = pixels.initial_state();
//! let mut rates = vec![0.0; pixels.dimension()];
//! pixels.compute_rates(state.as_slice(), &mut rates);
//! # Ok::<(), pixsim_rs::ModelError>(())
//! ```

pub mod compartment;
pub mod diffusion;
pub mod expression;
#[cfg(feature = "jit")]
mod jit;
pub mod membrane;
pub mod pixel_model;
pub mod reaction_set;
pub mod traits;

pub use compartment::CompartmentStepper;
pub use diffusion::DiffusionOperator;
pub use expression::{ExprEval, ExpressionError, MathBackend, SymbolTable};
pub use membrane::{MembraneStepper, Side};
pub use pixel_model::PixelModel;
pub use reaction_set::ReactionSet;
pub use traits::RateModel;
