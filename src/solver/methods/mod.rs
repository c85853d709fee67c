//! Explicit Runge-Kutta methods
//!
//! Every method is a static [`ButcherTableau`]. The
//! [`Integrator`](crate::solver::Integrator) only interprets tableaux, so
//! adding a method means adding a table.
//!
//! # Available Methods
//!
//! | Order | Method | Stages | Embedded solution |
//! |-------|--------|--------|-------------------|
//! | 1 | Forward Euler | 1 | none (fixed step) |
//! | 2 | Heun | 2 | Euler |
//! | 3 | SSP RK3 (Shu-Osher) | 3 | 2nd order |
//! | 4 | Merson 4(3) | 5 | 3rd order |
//!
//! Orders 2 to 4 estimate the local error from the difference between the
//! main and the embedded solution, which drives the adaptive step size.

mod tableau;

pub use tableau::{ButcherTableau, EULER, HEUN, MERSON, SSPRK3};

/// Tableau of the method with the given order
pub fn tableau(order: usize) -> Option<&'static ButcherTableau> {
    match order {
        1 => Some(&EULER),
        2 => Some(&HEUN),
        3 => Some(&SSPRK3),
        4 => Some(&MERSON),
        _ => None,
    }
}
