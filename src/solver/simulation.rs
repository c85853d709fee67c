//! Simulation session facade

use ndarray::Array3;

use crate::error::ModelError;
use crate::geometry::Geometry;
use crate::models::ModelDef;
use crate::physics::MathBackend;

use super::pixel::PixelSimulator;
use super::result::{AvgMinMax, SimulationResult};
use super::traits::{IntegratorOptions, Simulator, SimulatorType};

/// One simulation of one model on one geometry
///
/// Built once; changing the model or the geometry means building a new
/// `Simulation`. The time-zero snapshot is recorded on construction and one
/// more after every successful [`advance`](Simulation::advance).
pub struct Simulation {
    geometry: Geometry,
    simulator_type: SimulatorType,
    backend: MathBackend,
    simulator: Box<dyn Simulator>,
    result: SimulationResult,
    error: Option<String>,
}

impl Simulation {
    /// Build the backend selected by `simulator_type`
    ///
    /// Every geometry, model and expression error is reported here, before
    /// any rate is evaluated.
    pub fn new(
        model: &ModelDef,
        geometry: Geometry,
        simulator_type: SimulatorType,
        backend: MathBackend,
    ) -> Result<Self, ModelError> {
        let simulator: Box<dyn Simulator> = match simulator_type {
            SimulatorType::Pixel => Box::new(PixelSimulator::new(model, &geometry, backend)?),
        };

        let mut species = Vec::with_capacity(geometry.compartments().len());
        let mut colours = Vec::with_capacity(geometry.compartments().len());
        for compartment in geometry.compartments() {
            let fields = model.field_species(compartment.id());
            colours.push(fields.iter().map(|s| model.species_colour(&s.id)).collect());
            species.push(fields.into_iter().map(|s| s.id.clone()).collect());
        }

        let mut result = SimulationResult::new(&geometry, species, colours);
        result.add_metadata("model", &model.name);
        result.add_metadata("simulator", simulator.name());
        result.add_metadata("backend", backend.name());

        log::info!(
            "simulation '{}': {} simulator, {} math backend, {} thread(s)",
            model.name,
            simulator_type.name(),
            backend,
            simulator.max_threads()
        );

        let mut simulation = Self {
            geometry,
            simulator_type,
            backend,
            simulator,
            result,
            error: None,
        };
        simulation.record_snapshot();
        Ok(simulation)
    }

    fn record_snapshot(&mut self) {
        let blocks = (0..self.geometry.compartments().len())
            .map(|c| self.simulator.concentrations(c).to_vec())
            .collect();
        self.result.push(self.simulator.time(), blocks);
    }

    // =============================================================================================
    // Configuration
    // =============================================================================================

    pub fn simulator_type(&self) -> SimulatorType {
        self.simulator_type
    }

    pub fn math_backend(&self) -> MathBackend {
        self.backend
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn integrator_options(&self) -> IntegratorOptions {
        self.simulator.integrator_options()
    }

    /// Replace the integrator options; resets the remembered trial step
    pub fn set_integrator_options(&mut self, options: IntegratorOptions) -> Result<(), String> {
        self.simulator.set_integrator_options(options)?;
        self.result.add_metadata("integrator_order", &options.order.to_string());
        Ok(())
    }

    /// Request `n` worker threads, `0` for the rayon default
    ///
    /// A thread-pool failure is kept as the error message and the previous
    /// setting stays in place.
    pub fn set_max_threads(&mut self, n: usize) {
        if let Err(e) = self.simulator.set_max_threads(n) {
            log::error!("{}", e);
            self.error = Some(e.to_string());
        }
    }

    /// Worker threads actually in use
    pub fn max_threads(&self) -> usize {
        self.simulator.max_threads()
    }

    // =============================================================================================
    // Running
    // =============================================================================================

    /// Advance the simulation by `dt`
    ///
    /// Returns the number of accepted sub-steps. On failure the state is
    /// unchanged, no snapshot is added, `0` is returned and the reason is
    /// available from [`error_message`](Self::error_message).
    pub fn advance(&mut self, dt: f64) -> usize {
        match self.simulator.run(dt) {
            Ok(steps) => {
                self.error = None;
                self.record_snapshot();
                steps
            }
            Err(e) => {
                log::error!("advance by {} failed at t = {}: {}", dt, self.simulator.time(), e);
                self.error = Some(e.to_string());
                0
            }
        }
    }

    /// Reason of the last failure, cleared by the next successful advance
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // =============================================================================================
    // Queries
    // =============================================================================================

    pub fn time_points(&self) -> &[f64] {
        self.result.time_points()
    }

    pub fn avg_min_max(&self, t: usize, compartment: usize, species: usize) -> Option<AvgMinMax> {
        self.result.avg_min_max(t, compartment, species)
    }

    pub fn concentration(&self, t: usize, compartment: usize, species: usize) -> Option<&[f64]> {
        self.result.concentration(t, compartment, species)
    }

    /// RGBA preview image of layer `z` at time point `t`
    pub fn concentration_image(&self, t: usize, z: usize) -> Option<Array3<u8>> {
        self.result.concentration_image(t, z)
    }

    pub fn compartment_ids(&self) -> Vec<&str> {
        self.result.compartment_ids()
    }

    /// Non-constant species of a compartment, in state order
    pub fn species_ids(&self, compartment: usize) -> &[String] {
        self.result.species_ids(compartment)
    }

    pub fn result(&self) -> &SimulationResult {
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::library::very_simple_model;
    use crate::solver::MinStepPolicy;

    fn simulation() -> Simulation {
        let (model, geometry) = very_simple_model().unwrap();
        Simulation::new(&model, geometry, SimulatorType::Pixel, MathBackend::Interpreted).unwrap()
    }

    #[test]
    fn test_initial_snapshot() {
        let sim = simulation();
        assert_eq!(sim.time_points(), &[0.0]);
        assert_eq!(sim.compartment_ids(), vec!["c1", "c2", "c3"]);
        assert_eq!(sim.species_ids(0), &["B_c1".to_string()]);
        assert_eq!(sim.species_ids(2), &["A_c3".to_string(), "B_c3".to_string()]);
        assert_eq!(sim.result().metadata("backend"), Some("Interpreted"));
        assert_eq!(sim.error_message(), None);
    }

    #[test]
    fn test_advance_appends_snapshot() {
        let mut sim = simulation();
        assert!(sim.advance(0.25) > 0);
        assert!(sim.advance(0.25) > 0);
        assert_eq!(sim.time_points(), &[0.0, 0.25, 0.5]);
        assert!(sim.concentration(2, 1, 0).unwrap()[0] > 0.0);
    }

    #[test]
    fn test_failed_advance_keeps_state() {
        let mut sim = simulation();
        sim.set_integrator_options(IntegratorOptions {
            order: 2,
            max_rel_err: 1e-14,
            max_abs_err: 1e-14,
            min_timestep: 0.1,
            max_timestep: 1.0,
            min_step_policy: MinStepPolicy::Fail,
        })
        .unwrap();

        assert_eq!(sim.advance(1.0), 0);
        assert!(sim.error_message().unwrap().contains("minimum time step"));
        assert_eq!(sim.time_points(), &[0.0]);

        // a looser tolerance recovers, clearing the message
        sim.set_integrator_options(IntegratorOptions::default()).unwrap();
        assert!(sim.advance(1.0) > 0);
        assert_eq!(sim.error_message(), None);
        assert_eq!(sim.time_points(), &[0.0, 1.0]);
    }

    #[test]
    fn test_invalid_interval_reported() {
        let mut sim = simulation();
        assert_eq!(sim.advance(-1.0), 0);
        assert!(sim.error_message().is_some());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut sim = simulation();
        let err = sim
            .set_integrator_options(IntegratorOptions { order: 7, ..Default::default() })
            .unwrap_err();
        assert!(err.contains("order"));
        assert_eq!(sim.integrator_options().order, 2);
    }
}
