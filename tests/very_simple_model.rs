//! Three compartments in a column, coupled through two membranes
//!
//! Every value here is checked against a hand-derived right-hand side.

use approx::assert_relative_eq;
use pixsim_rs::models::library::very_simple_model;
use pixsim_rs::prelude::*;

mod common;
use common::{build, very_simple_rhs};

/// `[B_c1, A_c2, B_c2, A_c3, B_c3]` at time point `t`
fn state(sim: &Simulation, t: usize) -> [f64; 5] {
    let c = |comp, species| sim.concentration(t, comp, species).unwrap()[0];
    [c(0, 0), c(1, 0), c(1, 1), c(2, 0), c(2, 1)]
}

fn euler(dt: f64) -> Simulation {
    let (model, geometry) = very_simple_model().unwrap();
    let mut sim = build(&model, geometry);
    sim.set_integrator_options(IntegratorOptions {
        order: 1,
        max_timestep: dt,
        ..Default::default()
    })
    .unwrap();
    sim
}

#[test]
fn test_single_euler_step() {
    let dt = 0.134521234;
    let mut sim = euler(dt);
    assert_eq!(sim.advance(dt), 1);

    let y = state(&sim, 1);
    assert_relative_eq!(y[1], 0.1 * dt, max_relative = 1e-14);
    assert_eq!(y[0], 0.0);
    assert_eq!(y[2], 0.0);
    assert_eq!(y[3], 0.0);
    assert_eq!(y[4], 0.0);
}

#[test]
fn test_euler_steps_match_hand_derivation() {
    let dt = 0.134521234;
    let mut sim = euler(dt);

    let mut expected = [0.0; 5];
    for t in 1..=3 {
        let rate = very_simple_rhs(&expected);
        for (y, r) in expected.iter_mut().zip(rate) {
            *y += dt * r;
        }
        assert_eq!(sim.advance(dt), 1);

        let y = state(&sim, t);
        for (i, (&actual, &e)) in y.iter().zip(&expected).enumerate() {
            assert_relative_eq!(actual, e, max_relative = 1e-12, epsilon = 1e-300);
            if t == 2 && i == 3 {
                // A_c3 only appears once A_c2 is non-zero
                assert!(actual > 0.0);
            }
        }
    }
    // B reaches c3 on the third step, nothing has reached c1 yet
    assert!(state(&sim, 3)[4] > 0.0);
    assert_eq!(state(&sim, 3)[0], 0.0);
}

#[test]
fn test_adaptive_steady_state() {
    let (model, geometry) = very_simple_model().unwrap();
    let mut sim = build(&model, geometry);
    sim.set_integrator_options(IntegratorOptions {
        max_timestep: 0.20138571,
        ..Default::default()
    })
    .unwrap();

    assert!(sim.advance(1000.0) > 0);
    let y = state(&sim, 1);
    assert_relative_eq!(y[1], 4.0 / 7.0, max_relative = 1e-8);
    assert_relative_eq!(y[3], 1.0 / 7.0, max_relative = 1e-8);
    assert_relative_eq!(y[2], 3.0 / 14.0, max_relative = 1e-8);
    assert_relative_eq!(y[4], 3.0 / 14.0, max_relative = 1e-8);

    // B_c1 keeps accumulating at the steady excretion rate
    assert!(sim.advance(10.0) > 0);
    let growth = (state(&sim, 2)[0] - y[0]) / 10.0;
    assert_relative_eq!(growth, 0.3 / 7.0, max_relative = 1e-6);
}

#[test]
fn test_orders_agree_on_steady_state() {
    for order in 1..=4 {
        let (model, geometry) = very_simple_model().unwrap();
        let mut sim = build(&model, geometry);
        sim.set_integrator_options(IntegratorOptions {
            order,
            max_timestep: 0.1,
            ..Default::default()
        })
        .unwrap();
        assert!(sim.advance(500.0) > 0, "order {}: {:?}", order, sim.error_message());

        let y = state(&sim, 1);
        assert_relative_eq!(y[1], 4.0 / 7.0, max_relative = 1e-8);
        assert_relative_eq!(y[3], 1.0 / 7.0, max_relative = 1e-8);
        assert_relative_eq!(y[4], 3.0 / 14.0, max_relative = 1e-8);
    }
}

#[test]
fn test_constant_species_not_in_results() {
    let (model, geometry) = very_simple_model().unwrap();
    let mut sim = build(&model, geometry);
    sim.advance(1.0);

    assert_eq!(sim.species_ids(0), &["B_c1".to_string()]);
    assert!(sim.concentration(1, 0, 1).is_none());
}
