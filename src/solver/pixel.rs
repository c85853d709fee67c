//! Pixel simulator backend
//!
//! Couples a [`PixelModel`] with the adaptive [`Integrator`] and, with the
//! `parallel` feature, a dedicated rayon pool that both the evaluation
//! phases and the stage combinations run on.

use nalgebra::DVector;

use crate::error::{ModelError, SimulationError};
use crate::geometry::Geometry;
use crate::models::ModelDef;
use crate::physics::{MathBackend, PixelModel, RateModel};

use super::integrator::Integrator;
use super::traits::{IntegratorOptions, Simulator};

/// Finite-difference reaction-diffusion simulator on the voxel grid
pub struct PixelSimulator {
    model: PixelModel,
    integrator: Integrator,
    state: DVector<f64>,
    threads: usize,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl PixelSimulator {
    /// Build the steppers and the initial state
    ///
    /// Starts with the runtime default number of threads.
    pub fn new(model: &ModelDef, geometry: &Geometry, backend: MathBackend) -> Result<Self, ModelError> {
        let pixel_model = PixelModel::new(model, geometry, backend)?;
        let state = pixel_model.initial_state();
        let integrator = Integrator::new(state.len(), IntegratorOptions::default())
            .map_err(ModelError::InvalidOptions)?;

        let mut simulator = Self {
            model: pixel_model,
            integrator,
            state,
            threads: 1,
            #[cfg(feature = "parallel")]
            pool: None,
        };
        simulator.use_threads(0);
        Ok(simulator)
    }

    pub fn model(&self) -> &PixelModel {
        &self.model
    }

    pub fn state(&self) -> &DVector<f64> {
        &self.state
    }

    #[cfg(feature = "parallel")]
    fn use_threads(&mut self, n: usize) {
        let parallel = n != 1;
        self.model.set_parallel(parallel);
        self.integrator.set_parallel(parallel);
        self.threads = match (&self.pool, n) {
            (_, 1) => 1,
            (Some(pool), _) => pool.current_num_threads(),
            (None, _) => rayon::current_num_threads(),
        };
    }

    #[cfg(not(feature = "parallel"))]
    fn use_threads(&mut self, _n: usize) {
        self.model.set_parallel(false);
        self.integrator.set_parallel(false);
        self.threads = 1;
    }
}

impl Simulator for PixelSimulator {
    fn name(&self) -> &str {
        "Pixel"
    }

    fn run(&mut self, dt: f64) -> Result<usize, SimulationError> {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            let (model, integrator, state) = (&mut self.model, &mut self.integrator, &mut self.state);
            return pool
                .install(|| integrator.advance(model, state, dt))
                .map(|report| report.accepted);
        }

        self.integrator
            .advance(&mut self.model, &mut self.state, dt)
            .map(|report| report.accepted)
    }

    fn time(&self) -> f64 {
        self.integrator.time()
    }

    fn integrator_options(&self) -> IntegratorOptions {
        self.integrator.options()
    }

    fn set_integrator_options(&mut self, options: IntegratorOptions) -> Result<(), String> {
        self.integrator.set_options(options)
    }

    fn set_max_threads(&mut self, n: usize) -> Result<(), SimulationError> {
        #[cfg(feature = "parallel")]
        {
            self.pool = if n > 1 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;
                Some(pool)
            } else {
                None
            };
        }
        #[cfg(not(feature = "parallel"))]
        if n != 1 {
            log::warn!("built without the `parallel` feature, running on a single thread");
        }

        self.use_threads(n);
        log::info!("pixel simulator: {} thread(s)", self.threads);
        Ok(())
    }

    fn max_threads(&self) -> usize {
        self.threads
    }

    fn concentrations(&self, compartment: usize) -> &[f64] {
        match self.model.compartments().get(compartment) {
            Some(stepper) => &self.state.as_slice()[stepper.range()],
            None => &[],
        }
    }
}
