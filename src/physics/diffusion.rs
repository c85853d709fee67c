//! Finite-difference diffusion on a compartment's pixels
//!
//! ```text
//! dc_i/dt = D / dx² · Σ_{n ∈ neigh(i)} (c_n − c_i)
//! ```
//!
//! `neigh(i)` are the face neighbours of pixel `i` that belong to the same
//! compartment. A missing neighbour contributes nothing, which is a no-flux
//! boundary: the total amount of a diffusing species is conserved.

use crate::geometry::Compartment;

/// Discrete Laplacian over one compartment's fields
#[derive(Debug, Clone)]
pub struct DiffusionOperator {
    n_pixels: usize,
    /// `D / dx²` per field, zero for fields that do not diffuse
    coefficients: Vec<f64>,
    offsets: Vec<usize>,
    neighbours: Vec<usize>,
}

impl DiffusionOperator {
    /// Build the operator for `compartment`
    ///
    /// `diffusion_constants[f]` is `None` for a non-spatial field.
    pub fn new(compartment: &Compartment, diffusion_constants: &[Option<f64>], pixel_width: f64) -> Self {
        let n_pixels = compartment.n_pixels();
        let dx2 = pixel_width * pixel_width;
        let coefficients = diffusion_constants
            .iter()
            .map(|d| match d {
                Some(d) if *d > 0.0 => d / dx2,
                _ => 0.0,
            })
            .collect();

        let mut offsets = Vec::with_capacity(n_pixels + 1);
        let mut neighbours = Vec::new();
        offsets.push(0);
        for ix in 0..n_pixels {
            neighbours.extend_from_slice(compartment.neighbours(ix));
            offsets.push(neighbours.len());
        }

        Self {
            n_pixels,
            coefficients,
            offsets,
            neighbours,
        }
    }

    pub fn n_fields(&self) -> usize {
        self.coefficients.len()
    }

    /// Whether any field of the compartment diffuses
    pub fn is_active(&self) -> bool {
        self.coefficients.iter().any(|&k| k > 0.0)
    }

    /// Overwrite `dcdt` with the diffusion term of `conc`
    ///
    /// Both slices hold the compartment's fields back to back.
    pub fn apply(&self, conc: &[f64], dcdt: &mut [f64]) {
        let n = self.n_pixels;
        for (f, &k) in self.coefficients.iter().enumerate() {
            let c = &conc[f * n..(f + 1) * n];
            let d = &mut dcdt[f * n..(f + 1) * n];
            if k == 0.0 {
                d.fill(0.0);
                continue;
            }
            for (i, out) in d.iter_mut().enumerate() {
                let ci = c[i];
                let flux: f64 = self.neighbours[self.offsets[i]..self.offsets[i + 1]]
                    .iter()
                    .map(|&j| c[j] - ci)
                    .sum();
                *out = k * flux;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{voxels_in_box, Geometry};
    use approx::assert_relative_eq;

    fn row(n: usize) -> Geometry {
        let mut g = Geometry::new([n, 1, 1], 0.5).unwrap();
        g.add_compartment("row", voxels_in_box([0, 0, 0], [n, 1, 1])).unwrap();
        g
    }

    #[test]
    fn test_laplacian_of_spike() {
        let g = row(3);
        let op = DiffusionOperator::new(&g.compartments()[0], &[Some(1.0)], g.pixel_width());
        let conc = [0.0, 1.0, 0.0];
        let mut dcdt = [9.0; 3];
        op.apply(&conc, &mut dcdt);

        // D / dx² = 4
        assert_eq!(dcdt, [4.0, -8.0, 4.0]);
    }

    #[test]
    fn test_rates_sum_to_zero() {
        let mut g = Geometry::new([4, 3, 1], 1.0).unwrap();
        g.add_compartment("block", voxels_in_box([0, 0, 0], [4, 3, 1])).unwrap();
        let op = DiffusionOperator::new(&g.compartments()[0], &[Some(0.7)], 1.0);

        let conc: Vec<f64> = (0..12).map(|i| (i * i % 7) as f64).collect();
        let mut dcdt = vec![0.0; 12];
        op.apply(&conc, &mut dcdt);

        assert_relative_eq!(dcdt.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_spatial_and_zero_d_fields_reset() {
        let g = row(2);
        let op = DiffusionOperator::new(&g.compartments()[0], &[None, Some(0.0), Some(1.0)], 1.0);
        assert_eq!(op.n_fields(), 3);
        assert!(op.is_active());

        let conc = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let mut dcdt = [5.0; 6];
        op.apply(&conc, &mut dcdt);
        assert_eq!(dcdt, [0.0, 0.0, 0.0, 0.0, -1.0, 1.0]);
    }

    #[test]
    fn test_inactive_operator() {
        let g = row(2);
        let op = DiffusionOperator::new(&g.compartments()[0], &[None], 1.0);
        assert!(!op.is_active());
    }
}
