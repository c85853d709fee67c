//! Helper functions for integration tests

#![allow(dead_code)]

use pixsim_rs::prelude::*;

/// Simulation on the interpreted backend
pub fn build(model: &ModelDef, geometry: Geometry) -> Simulation {
    Simulation::new(model, geometry, SimulatorType::Pixel, MathBackend::Interpreted)
        .expect("test model must build")
}

/// Total amount of one species over its compartment at time point `t`
pub fn field_sum(sim: &Simulation, t: usize, compartment: usize, species: usize) -> f64 {
    sim.concentration(t, compartment, species)
        .expect("field must exist")
        .iter()
        .sum()
}

/// Assert that two fields agree element-wise within a relative tolerance
pub fn assert_fields_close(actual: &[f64], expected: &[f64], tolerance: f64, message: &str) {
    assert_eq!(actual.len(), expected.len(), "{}: length mismatch", message);
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        let error = relative_error(a, e);
        assert!(
            error < tolerance,
            "{}: element {} is {} instead of {} (relative error {:e})",
            message, i, a, e, error
        );
    }
}

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Right-hand side of the three-compartment membrane model, derived by hand
///
/// State order: `[B_c1, A_c2, B_c2, A_c3, B_c3]`, with `A_c1 = 1` constant.
pub fn very_simple_rhs(y: &[f64; 5]) -> [f64; 5] {
    let [_, a2, b2, a3, b3] = *y;
    [
        0.2 * b2,
        0.1 * (1.0 - a2) - 0.1 * (a2 - a3),
        0.2 * b3 - 0.2 * b2,
        0.1 * (a2 - a3) - 0.3 * a3,
        0.3 * a3 - 0.2 * b3,
    ]
}
