//! Butcher tableaux
//!
//! ```text
//! c₁ |
//! c₂ | a₂₁
//! c₃ | a₃₁ a₃₂
//! ---+------------
//!    | b₁  b₂  b₃      main solution
//!    | b̂₁  b̂₂  b̂₃      embedded solution
//! ```
//!
//! Stage `s` is `k_s = f(y + dt · Σ_{j<s} a_sj k_j)` and the new state is
//! `y + dt · Σ_s b_s k_s`. The system is autonomous, so `c` is only kept for
//! documentation and consistency checks.

/// Coefficients of an explicit Runge-Kutta method
#[derive(Debug)]
pub struct ButcherTableau {
    pub name: &'static str,
    pub order: usize,
    pub c: &'static [f64],
    /// Lower-triangular stage coefficients, row `s` has `s` entries
    pub a: &'static [&'static [f64]],
    pub b: &'static [f64],
    /// Weights of the lower-order embedded solution, if any
    pub b_hat: Option<&'static [f64]>,
}

impl ButcherTableau {
    pub fn stages(&self) -> usize {
        self.b.len()
    }

    /// Whether the method estimates its own local error
    pub fn is_adaptive(&self) -> bool {
        self.b_hat.is_some()
    }
}

/// Forward Euler
pub static EULER: ButcherTableau = ButcherTableau {
    name: "Forward Euler",
    order: 1,
    c: &[0.0],
    a: &[&[]],
    b: &[1.0],
    b_hat: None,
};

/// Heun's method with embedded Euler
pub static HEUN: ButcherTableau = ButcherTableau {
    name: "Heun",
    order: 2,
    c: &[0.0, 1.0],
    a: &[&[], &[1.0]],
    b: &[0.5, 0.5],
    b_hat: Some(&[1.0, 0.0]),
};

/// Three-stage strong-stability-preserving RK3 with embedded Heun
pub static SSPRK3: ButcherTableau = ButcherTableau {
    name: "SSP RK3",
    order: 3,
    c: &[0.0, 1.0, 0.5],
    a: &[&[], &[1.0], &[0.25, 0.25]],
    b: &[1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0],
    b_hat: Some(&[0.5, 0.5, 0.0]),
};

/// Merson 4(3)
pub static MERSON: ButcherTableau = ButcherTableau {
    name: "Merson",
    order: 4,
    c: &[0.0, 1.0 / 3.0, 1.0 / 3.0, 0.5, 1.0],
    a: &[
        &[],
        &[1.0 / 3.0],
        &[1.0 / 6.0, 1.0 / 6.0],
        &[0.125, 0.0, 0.375],
        &[0.5, 0.0, -1.5, 2.0],
    ],
    b: &[1.0 / 6.0, 0.0, 0.0, 2.0 / 3.0, 1.0 / 6.0],
    b_hat: Some(&[0.1, 0.0, 0.3, 0.4, 0.2]),
};
