//! Cross-order consistency on the Brusselator
//!
//! Orders 2-4 at moderate tolerance must follow a tight order-4 reference.

use approx::assert_relative_eq;
use pixsim_rs::models::library::brusselator;
use pixsim_rs::prelude::*;

mod common;
use common::build;

const INTERVAL: f64 = 0.5;
const SNAPSHOTS: usize = 10;

/// Averages of X and Y at every snapshot
fn trajectory(options: IntegratorOptions) -> Vec<(f64, f64)> {
    let (model, geometry) = brusselator().unwrap();
    let mut sim = build(&model, geometry);
    sim.set_integrator_options(options).unwrap();
    for _ in 0..SNAPSHOTS {
        assert!(sim.advance(INTERVAL) > 0, "{:?}", sim.error_message());
    }
    (0..=SNAPSHOTS)
        .map(|t| (sim.avg_min_max(t, 0, 0).unwrap().avg, sim.avg_min_max(t, 0, 1).unwrap().avg))
        .collect()
}

#[test]
fn test_orders_follow_reference() {
    let reference = trajectory(IntegratorOptions {
        order: 4,
        max_rel_err: 1e-10,
        ..Default::default()
    });

    for order in 2..=4 {
        let result = trajectory(IntegratorOptions {
            order,
            max_rel_err: 1e-6,
            ..Default::default()
        });
        for (t, (actual, expected)) in result.iter().zip(&reference).enumerate() {
            assert_relative_eq!(actual.0, expected.0, max_relative = 1e-3);
            assert_relative_eq!(actual.1, expected.1, max_relative = 1e-3);
            if t == 0 {
                assert_relative_eq!(actual.0, 1.2, max_relative = 1e-12);
                assert_relative_eq!(actual.1, 3.1, max_relative = 1e-12);
            }
        }
    }
}

#[test]
fn test_uniform_field_stays_uniform() {
    let (model, geometry) = brusselator().unwrap();
    let mut sim = build(&model, geometry);
    sim.advance(2.0);

    for species in 0..2 {
        let stats = sim.avg_min_max(1, 0, species).unwrap();
        assert_relative_eq!(stats.min, stats.max, max_relative = 1e-12);
    }
}

#[test]
fn test_tighter_tolerance_takes_more_steps() {
    let steps = |max_rel_err| {
        let (model, geometry) = brusselator().unwrap();
        let mut sim = build(&model, geometry);
        sim.set_integrator_options(IntegratorOptions {
            order: 3,
            max_rel_err,
            ..Default::default()
        })
        .unwrap();
        sim.advance(5.0)
    };
    assert!(steps(1e-7) > steps(1e-3));
}

#[test]
fn test_approaches_fixed_point() {
    // b < 1 + a^2, so the fixed point (a, b / a) is stable
    let (model, geometry) = brusselator().unwrap();
    let mut sim = build(&model, geometry);
    sim.set_integrator_options(IntegratorOptions {
        order: 4,
        max_rel_err: 1e-6,
        ..Default::default()
    })
    .unwrap();
    assert!(sim.advance(200.0) > 0);

    assert_relative_eq!(sim.avg_min_max(1, 0, 0).unwrap().avg, 1.0, max_relative = 1e-5);
    assert_relative_eq!(sim.avg_min_max(1, 0, 1).unwrap().avg, 1.7, max_relative = 1e-5);
}
