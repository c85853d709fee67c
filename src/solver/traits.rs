//! Simulator traits and configuration types
//!
//! # Design Philosophy
//!
//! - Central enum [`SimulatorType`] tags which backend runs a simulation
//! - [`IntegratorOptions`] carries every numerical knob of the adaptive
//!   integrator and validates itself
//! - [`Simulator`] is the capability a backend provides; the
//!   [`Simulation`](crate::solver::Simulation) facade only talks to it
//!
//! Backends share no internal state, so adding one means implementing
//! [`Simulator`] and adding a [`SimulatorType`] variant.

use crate::error::SimulationError;

// =================================================================================================
// Simulator type
// =================================================================================================

/// Available simulation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SimulatorType {
    /// Finite differences on the voxel grid with an explicit adaptive integrator
    #[default]
    Pixel,
}

impl SimulatorType {
    /// Get name identifier
    pub fn name(&self) -> &str {
        match self {
            SimulatorType::Pixel => "Pixel",
        }
    }
}

// =================================================================================================
// Integrator options
// =================================================================================================

/// What to do when a rejected step would fall below the minimum step size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinStepPolicy {
    /// Abort the advance with [`SimulationError::MinStepReached`]
    #[default]
    Fail,
    /// Accept the step at the current size, log a warning and carry on
    AcceptAndWarn,
}

/// Numerical parameters of the adaptive Runge-Kutta integrator
///
/// # Examples
///
/// ```rust
/// use pixsim_rs::solver::IntegratorOptions;
///
/// let options = IntegratorOptions {
///     order: 4,
///     max_rel_err: 1e-6,
///     ..Default::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorOptions {
    /// Runge-Kutta order, 1 to 4
    pub order: usize,
    /// Largest accepted absolute difference between the two embedded solutions
    pub max_abs_err: f64,
    /// Largest accepted relative difference between the two embedded solutions
    pub max_rel_err: f64,
    /// Upper bound on a single sub-step
    pub max_timestep: f64,
    /// Lower bound on a sub-step reached through rejections
    pub min_timestep: f64,
    pub min_step_policy: MinStepPolicy,
}

impl Default for IntegratorOptions {
    fn default() -> Self {
        Self {
            order: 2,
            max_abs_err: f64::MAX,
            max_rel_err: 0.005,
            max_timestep: f64::MAX,
            min_timestep: 1e-12,
            min_step_policy: MinStepPolicy::Fail,
        }
    }
}

impl IntegratorOptions {
    /// Validate that parameters are numerically meaningful
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=4).contains(&self.order) {
            return Err(format!("Integrator order must be between 1 and 4, got {}", self.order));
        }
        if !(self.max_abs_err > 0.0) {
            return Err("Maximum absolute error must be positive".to_string());
        }
        if !(self.max_rel_err > 0.0) {
            return Err("Maximum relative error must be positive".to_string());
        }
        if !(self.max_timestep > 0.0) {
            return Err("Maximum time step must be positive".to_string());
        }
        if !self.min_timestep.is_finite() || !(self.min_timestep > 0.0) {
            return Err(format!("Minimum time step must be positive and finite, got {}", self.min_timestep));
        }
        if self.min_timestep > self.max_timestep {
            return Err(format!(
                "Minimum time step {} exceeds maximum time step {}",
                self.min_timestep, self.max_timestep
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Simulator trait
// =================================================================================================

/// A simulation backend
///
/// Concentrations are reported per compartment as one block: the
/// non-constant species fields back to back, `n_pixels` values each.
pub trait Simulator: Send {
    fn name(&self) -> &str;

    /// Integrate forward by `dt`, returning the number of accepted sub-steps
    ///
    /// On error the state and time are left as they were.
    fn run(&mut self, dt: f64) -> Result<usize, SimulationError>;

    /// Current simulation time
    fn time(&self) -> f64;

    fn integrator_options(&self) -> IntegratorOptions;

    fn set_integrator_options(&mut self, options: IntegratorOptions) -> Result<(), String>;

    /// Request `n` worker threads, `0` for the runtime default
    fn set_max_threads(&mut self, n: usize) -> Result<(), SimulationError>;

    /// Worker threads actually used
    fn max_threads(&self) -> usize;

    /// Current concentration block of one compartment
    fn concentrations(&self, compartment: usize) -> &[f64];
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = IntegratorOptions::default();
        assert_eq!(options.order, 2);
        assert_eq!(options.max_rel_err, 0.005);
        assert_eq!(options.min_timestep, 1e-12);
        assert_eq!(options.min_step_policy, MinStepPolicy::Fail);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_order() {
        for order in [0, 5] {
            let options = IntegratorOptions { order, ..Default::default() };
            assert!(options.validate().unwrap_err().contains("order"));
        }
    }

    #[test]
    fn test_invalid_tolerances() {
        let options = IntegratorOptions { max_rel_err: 0.0, ..Default::default() };
        assert!(options.validate().is_err());

        let options = IntegratorOptions { max_abs_err: f64::NAN, ..Default::default() };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_min_timestep_must_be_positive() {
        for min_timestep in [0.0, -1e-12, f64::NAN, f64::INFINITY] {
            let options = IntegratorOptions { min_timestep, ..Default::default() };
            assert!(options.validate().unwrap_err().contains("Minimum time step"));
        }
    }

    #[test]
    fn test_min_above_max_timestep() {
        let options = IntegratorOptions {
            max_timestep: 0.1,
            min_timestep: 0.2,
            ..Default::default()
        };
        assert!(options.validate().unwrap_err().contains("exceeds"));
    }

    #[test]
    fn test_simulator_type_name() {
        assert_eq!(SimulatorType::default().name(), "Pixel");
    }
}
