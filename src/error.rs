//! Error types shared across the crate
//!
//! Two families of errors exist, matching the two moments at which things can
//! go wrong:
//!
//! - [`ModelError`]: raised while a simulation is being **built**. Geometry
//!   inconsistencies, unknown ids and expression compile failures all end up
//!   here, before any rate is ever evaluated.
//! - [`SimulationError`]: raised while a simulation is being **advanced**.
//!   These never escape [`Simulation::advance`](crate::solver::Simulation::advance);
//!   the facade turns them into a retrievable message instead.

use thiserror::Error;

use crate::physics::ExpressionError;

// =================================================================================================
// Construction errors
// =================================================================================================

/// Geometry or model inconsistency detected at construction time
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    #[error("voxel ({x}, {y}, {z}) of compartment '{compartment}' lies outside the geometry")]
    VoxelOutOfBounds {
        compartment: String,
        x: usize,
        y: usize,
        z: usize,
    },

    #[error("voxel ({x}, {y}, {z}) is claimed by both '{first}' and '{second}'")]
    OverlappingVoxel {
        first: String,
        second: String,
        x: usize,
        y: usize,
        z: usize,
    },

    #[error("unknown compartment '{0}'")]
    UnknownCompartment(String),

    #[error("membrane '{0}' joins a compartment to itself")]
    SelfMembrane(String),

    #[error("membrane '{membrane}': pixel pair ({ix_a}, {ix_b}) is not a pair of adjacent voxels")]
    NotAdjacent {
        membrane: String,
        ix_a: usize,
        ix_b: usize,
    },

    #[error("reaction '{reaction}' is located in unknown region '{location}'")]
    UnknownLocation { reaction: String, location: String },

    #[error("reaction '{reaction}' uses species '{species}' which is not available in '{region}'")]
    SpeciesNotInRegion {
        reaction: String,
        species: String,
        region: String,
    },

    #[error("species '{species}': initial field has {actual} values but the compartment has {expected} pixels")]
    InitialFieldLength {
        species: String,
        expected: usize,
        actual: usize,
    },

    #[error("constant species '{0}' must have a uniform initial concentration")]
    NonUniformConstant(String),

    #[error("species '{species}': {reason}")]
    InvalidSpecies { species: String, reason: String },

    #[error("invalid integrator options: {0}")]
    InvalidOptions(String),

    #[error("{region}: rate of '{species}' failed to compile: {source}")]
    Expression {
        region: String,
        species: String,
        #[source]
        source: ExpressionError,
    },
}

// =================================================================================================
// Run-time errors
// =================================================================================================

/// Terminal failure of an advance call
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(
        "minimum time step {min_timestep:e} reached at t = {time} without meeting the error tolerance (error ratio {error_ratio:.3e})"
    )]
    MinStepReached {
        time: f64,
        min_timestep: f64,
        error_ratio: f64,
    },

    #[error("sub-step {dt:e} no longer advances the time at t = {time}")]
    Stalled { time: f64, dt: f64 },

    #[error("{0}")]
    NonFinite(String),

    #[error("invalid integrator options: {0}")]
    InvalidOptions(String),

    #[error("thread pool error: {0}")]
    ThreadPool(String),
}
