//! Non-spatial species, pair-less membranes and the minimum step floor

use approx::assert_relative_eq;
use pixsim_rs::models::library::very_simple_model;
use pixsim_rs::prelude::*;

mod common;
use common::{build, empty_membrane_model, mixed_spatial_model, stiff_pixel_model};

#[test]
fn test_non_spatial_field_uniform_after_every_advance() {
    let (model, geometry) = mixed_spatial_model();
    let mut sim = build(&model, geometry);
    assert_eq!(sim.species_ids(0), &["S".to_string(), "N".to_string()]);

    for t in 1..=5 {
        assert!(sim.advance(0.2) > 0);
        let n = sim.avg_min_max(t, 0, 1).unwrap();
        assert_eq!(n.min, n.max, "N not uniform at time point {}", t);

        // the spatial source keeps its gradient
        let s = sim.avg_min_max(t, 0, 0).unwrap();
        assert!(s.max > s.min);
    }
    // N is fed by the average of S: 0.5 * 3 at t = 0
    assert!(sim.avg_min_max(1, 0, 1).unwrap().avg > 0.0);
}

#[test]
fn test_non_spatial_growth_uses_average_source() {
    let (model, geometry) = mixed_spatial_model();
    let mut sim = build(&model, geometry);
    sim.set_integrator_options(IntegratorOptions {
        order: 1,
        max_timestep: 0.01,
        ..Default::default()
    })
    .unwrap();
    sim.advance(0.01);

    // dN/dt = 0.5 * mean(S) = 0.5 * 3
    let n = sim.concentration(1, 0, 1).unwrap();
    for value in n {
        assert_relative_eq!(*value, 0.015, max_relative = 1e-12);
    }
}

#[test]
fn test_empty_membrane_couples_nothing() {
    let (model, geometry) = empty_membrane_model();
    assert!(geometry.membranes()[0].pairs().is_empty());

    let mut sim = build(&model, geometry);
    sim.set_integrator_options(IntegratorOptions {
        order: 4,
        max_rel_err: 1e-8,
        ..Default::default()
    })
    .unwrap();
    assert!(sim.advance(2.0) > 0);

    assert_relative_eq!(sim.avg_min_max(1, 0, 0).unwrap().avg, (-1.0_f64).exp(), max_relative = 1e-6);
    assert_eq!(sim.avg_min_max(1, 1, 0).unwrap().max, 0.0);
}

fn strict(policy: MinStepPolicy) -> IntegratorOptions {
    IntegratorOptions {
        order: 2,
        max_rel_err: 1e-14,
        max_abs_err: 1e-14,
        min_timestep: 0.05,
        max_timestep: 1.0,
        min_step_policy: policy,
    }
}

#[test]
fn test_min_step_fail_keeps_state() {
    let (model, geometry) = very_simple_model().unwrap();
    let mut sim = build(&model, geometry);
    sim.set_integrator_options(strict(MinStepPolicy::Fail)).unwrap();

    assert_eq!(sim.advance(1.0), 0);
    assert!(sim.error_message().unwrap().contains("minimum time step"));
    assert_eq!(sim.time_points(), &[0.0]);
    assert_eq!(sim.concentration(0, 1, 0).unwrap(), &[0.0]);
}

#[test]
fn test_min_step_accept_and_warn_completes() {
    let (model, geometry) = very_simple_model().unwrap();
    let mut sim = build(&model, geometry);
    sim.set_integrator_options(strict(MinStepPolicy::AcceptAndWarn)).unwrap();

    let steps = sim.advance(1.0);
    assert!(steps > 0);
    assert_eq!(sim.error_message(), None);
    assert_eq!(sim.time_points(), &[0.0, 1.0]);
    assert!(sim.concentration(1, 1, 0).unwrap()[0] > 0.0);
}

#[test]
fn test_zero_min_timestep_rejected() {
    let (model, geometry) = stiff_pixel_model();
    let mut sim = build(&model, geometry);

    let err = sim
        .set_integrator_options(IntegratorOptions { min_timestep: 0.0, ..Default::default() })
        .unwrap_err();
    assert!(err.contains("Minimum time step"));
    assert_eq!(sim.integrator_options().min_timestep, 1e-12);
}

#[test]
fn test_stiff_rate_stops_at_default_floor() {
    let (model, geometry) = stiff_pixel_model();
    let mut sim = build(&model, geometry);

    assert_eq!(sim.advance(1.0), 0);
    assert!(sim.error_message().unwrap().contains("minimum time step"));
    assert_eq!(sim.time_points(), &[0.0]);
    assert_eq!(sim.concentration(0, 0, 0).unwrap(), &[1.0]);
}
