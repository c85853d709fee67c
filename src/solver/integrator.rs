//! Adaptive explicit Runge-Kutta integrator
//!
//! # Algorithm
//!
//! For `advance(dt_total)` the integrator repeats sub-steps until `dt_total`
//! is covered:
//!
//! 1. Take the trial step `dt = min(next_dt, remaining)`.
//! 2. Evaluate the stages of the configured [`ButcherTableau`] and form the
//!    main solution `y` and, for orders ≥ 2, the embedded solution `ŷ`.
//! 3. Measure the error
//!
//!    ```text
//!    err_abs = max |y − ŷ|
//!    err_rel = max |y − ŷ| / max(|y|, 1e-10)
//!    ratio   = max(err_abs / max_abs_err, err_rel / max_rel_err)
//!    ```
//!
//! 4. If `ratio > 1`, halve `dt` and retry. Otherwise accept, and grow the
//!    next trial step by `clamp(0.95 · ratio^(−1/order), 1, 2)`, capped at
//!    `max_timestep`.
//!
//! Order 1 has no error estimate and always steps with
//! `min(max_timestep, remaining)`.
//!
//! A rejection that would push `dt / 2` below `min_timestep` triggers the
//! [`MinStepPolicy`]. An accepted sub-step too small to move the time
//! forward fails the advance. The state is only committed once the whole
//! advance succeeded.

use nalgebra::DVector;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::SimulationError;
use crate::physics::RateModel;

use super::methods::{tableau, ButcherTableau};
use super::parallel_threshold;
use super::traits::{IntegratorOptions, MinStepPolicy};
use super::validate_state;

const GROWTH_SAFETY: f64 = 0.95;
const MAX_GROWTH: f64 = 2.0;
const REL_ERR_FLOOR: f64 = 1e-10;
/// Relative slack under which the remaining interval is taken in one step
const TIME_EPS: f64 = 1e-10;

/// Outcome of one successful advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Accepted sub-steps
    pub accepted: usize,
    /// Rejected trial steps
    pub rejected: usize,
    /// Sub-steps accepted at the minimum step size despite a large error
    pub forced: usize,
}

/// Runge-Kutta integrator with embedded error control
#[derive(Debug)]
pub struct Integrator {
    options: IntegratorOptions,
    tableau: &'static ButcherTableau,
    time: f64,
    next_dt: f64,
    total_steps: usize,
    parallel: bool,
    stages: Vec<DVector<f64>>,
    y_stage: DVector<f64>,
    y_new: DVector<f64>,
    y_hat: DVector<f64>,
}

impl Integrator {
    /// Integrator for states of length `dimension`
    pub fn new(dimension: usize, options: IntegratorOptions) -> Result<Self, String> {
        options.validate()?;
        let tableau = tableau(options.order).ok_or_else(|| format!("No method of order {}", options.order))?;
        Ok(Self {
            options,
            tableau,
            time: 0.0,
            next_dt: options.max_timestep,
            total_steps: 0,
            parallel: cfg!(feature = "parallel"),
            stages: vec![DVector::zeros(dimension); tableau.stages()],
            y_stage: DVector::zeros(dimension),
            y_new: DVector::zeros(dimension),
            y_hat: DVector::zeros(dimension),
        })
    }

    pub fn options(&self) -> IntegratorOptions {
        self.options
    }

    /// Replace the options and reset the trial step
    pub fn set_options(&mut self, options: IntegratorOptions) -> Result<(), String> {
        options.validate()?;
        let tableau = tableau(options.order).ok_or_else(|| format!("No method of order {}", options.order))?;
        let dimension = self.y_new.len();
        self.stages = vec![DVector::zeros(dimension); tableau.stages()];
        self.tableau = tableau;
        self.options = options;
        self.next_dt = options.max_timestep;
        log::info!(
            "integrator: {} (order {}), max_rel_err {:e}, max_abs_err {:e}, max_timestep {:e}",
            tableau.name,
            options.order,
            options.max_rel_err,
            options.max_abs_err,
            options.max_timestep
        );
        Ok(())
    }

    pub fn method_name(&self) -> &'static str {
        self.tableau.name
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Trial size of the next sub-step
    pub fn next_dt(&self) -> f64 {
        self.next_dt
    }

    /// Accepted sub-steps since construction
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Combine stages on the current rayon pool above the parallel threshold
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel && cfg!(feature = "parallel");
    }

    /// Integrate `state` forward by `dt_total`
    ///
    /// `state` and the integrator's clock are only updated on success.
    pub fn advance<M: RateModel + ?Sized>(
        &mut self,
        model: &mut M,
        state: &mut DVector<f64>,
        dt_total: f64,
    ) -> Result<StepReport, SimulationError> {
        if !(dt_total > 0.0) || !dt_total.is_finite() {
            return Err(SimulationError::InvalidOptions(format!(
                "time interval must be positive and finite, got {}",
                dt_total
            )));
        }

        let saved_next_dt = self.next_dt;
        let saved_total = self.total_steps;
        let result = self.advance_inner(model, state, dt_total);
        if result.is_err() {
            self.next_dt = saved_next_dt;
            self.total_steps = saved_total;
        }
        result
    }

    fn advance_inner<M: RateModel + ?Sized>(
        &mut self,
        model: &mut M,
        state: &mut DVector<f64>,
        dt_total: f64,
    ) -> Result<StepReport, SimulationError> {
        let mut y = state.clone();
        let mut report = StepReport::default();
        let mut elapsed = 0.0;
        let order = self.options.order as f64;

        while elapsed < dt_total {
            let remaining = dt_total - elapsed;
            let truncated = self.next_dt * (1.0 + TIME_EPS) >= remaining;
            let mut dt = if truncated { remaining } else { self.next_dt };

            // ====== Step 1: find an acceptable sub-step ======
            let ratio = loop {
                self.step(model, &y, dt);
                if !self.tableau.is_adaptive() {
                    break 0.0;
                }
                let ratio = self.error_ratio();
                if !(ratio > 1.0) {
                    break ratio;
                }
                if dt / 2.0 < self.options.min_timestep {
                    match self.options.min_step_policy {
                        MinStepPolicy::Fail => {
                            return Err(SimulationError::MinStepReached {
                                time: self.time + elapsed,
                                min_timestep: self.options.min_timestep,
                                error_ratio: ratio,
                            });
                        }
                        MinStepPolicy::AcceptAndWarn => {
                            report.forced += 1;
                            break ratio;
                        }
                    }
                }
                report.rejected += 1;
                dt /= 2.0;
            };

            // ====== Step 2: accept ======
            if dt != remaining && elapsed + dt == elapsed {
                return Err(SimulationError::Stalled {
                    time: self.time + elapsed,
                    dt,
                });
            }
            std::mem::swap(&mut y, &mut self.y_new);
            elapsed = if dt == remaining { dt_total } else { elapsed + dt };
            report.accepted += 1;
            self.total_steps += 1;

            validate_state(y.as_slice(), &*model, self.total_steps).map_err(SimulationError::NonFinite)?;

            // ====== Step 3: next trial step ======
            if self.tableau.is_adaptive() {
                let grown = if ratio > 1.0 {
                    dt
                } else {
                    (dt * (GROWTH_SAFETY * ratio.powf(-1.0 / order)).clamp(1.0, MAX_GROWTH))
                        .min(self.options.max_timestep)
                };
                self.next_dt = if dt == remaining {
                    grown.max(self.next_dt)
                } else {
                    grown
                };
            }
        }

        if report.forced > 0 {
            log::warn!(
                "{} sub-step(s) accepted at the minimum time step {:e} without meeting the error tolerance",
                report.forced,
                self.options.min_timestep
            );
        }
        log::debug!(
            "advance {}: {} accepted, {} rejected, next dt {:e}",
            dt_total,
            report.accepted,
            report.rejected,
            self.next_dt
        );

        *state = y;
        self.time += dt_total;
        Ok(report)
    }

    fn combine_threshold(&self) -> usize {
        if self.parallel { parallel_threshold() } else { usize::MAX }
    }

    /// One trial step of size `dt` from `y` into `y_new` (and `y_hat`)
    fn step<M: RateModel + ?Sized>(&mut self, model: &mut M, y: &DVector<f64>, dt: f64) {
        let t = self.tableau;
        let threshold = self.combine_threshold();
        for s in 0..t.stages() {
            if s == 0 {
                model.compute_rates(y.as_slice(), self.stages[0].as_mut_slice());
                continue;
            }
            combine(&mut self.y_stage, y, dt, t.a[s], &self.stages[..s], threshold);
            model.compute_rates(self.y_stage.as_slice(), self.stages[s].as_mut_slice());
        }
        combine(&mut self.y_new, y, dt, t.b, &self.stages, threshold);
        if let Some(b_hat) = t.b_hat {
            combine(&mut self.y_hat, y, dt, b_hat, &self.stages, threshold);
        }
    }

    fn error_ratio(&self) -> f64 {
        let mut err_abs: f64 = 0.0;
        let mut err_rel: f64 = 0.0;
        for (y, y_hat) in self.y_new.iter().zip(self.y_hat.iter()) {
            let diff = (y - y_hat).abs();
            err_abs = err_abs.max(diff);
            err_rel = err_rel.max(diff / y.abs().max(REL_ERR_FLOOR));
        }
        (err_abs / self.options.max_abs_err).max(err_rel / self.options.max_rel_err)
    }
}

/// `out = y + dt · Σ_j weights[j] · stages[j]`, split across the pool above `threshold`
fn combine(
    out: &mut DVector<f64>,
    y: &DVector<f64>,
    dt: f64,
    weights: &[f64],
    stages: &[DVector<f64>],
    threshold: usize,
) {
    let element = |i: usize| -> f64 {
        let mut acc = 0.0;
        for (w, k) in weights.iter().zip(stages) {
            if *w != 0.0 {
                acc += w * k[i];
            }
        }
        y[i] + dt * acc
    };

    #[cfg(feature = "parallel")]
    if out.len() > threshold {
        out.as_mut_slice()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, o)| *o = element(i));
        return;
    }
    let _ = threshold;

    for (i, o) in out.iter_mut().enumerate() {
        *o = element(i);
    }
}

// =================================================================================================
// Tests
// =================================================================================================
