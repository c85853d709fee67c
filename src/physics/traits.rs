//! Rate model trait
//!
//! A [`RateModel`] is the physics side of an ODE system `dy/dt = f(y)` over a
//! flat state vector. The integrator only ever talks to this trait, so the
//! pixel reaction-diffusion model and the small analytical models used in the
//! tests are interchangeable.

use nalgebra::DVector;

/// Right-hand side of an autonomous ODE system over a flat state vector
///
/// Models own their scratch buffers, which is why [`compute_rates`] takes
/// `&mut self`. The integrator guarantees `state.len() == rates.len() ==
/// dimension()`.
///
/// [`compute_rates`]: RateModel::compute_rates
pub trait RateModel: Send {
    /// Length of the state vector
    fn dimension(&self) -> usize;

    /// Overwrite `rates` with `f(state)`
    ///
    /// Every entry of `rates` must be written; the buffer is reused between
    /// stages and holds stale values on entry.
    fn compute_rates(&mut self, state: &[f64], rates: &mut [f64]);

    /// State at time zero
    fn initial_state(&self) -> DVector<f64>;

    /// Name of the model (used to display and logging)
    fn name(&self) -> &str;

    /// Description of the model (option)
    fn description(&self) -> Option<&str> {
        None
    }

    /// Human-readable location of a state entry, for diagnostics
    fn locate(&self, index: usize) -> String {
        format!("state[{}]", index)
    }
}
