//! Time-stamped simulation results
//!
//! The store is append-only: one entry per completed advance, plus the
//! initial state at time zero. Each entry keeps the full concentration block
//! of every compartment together with per-species average, minimum and
//! maximum.

use std::collections::HashMap;

use ndarray::Array3;

use crate::geometry::{Geometry, Voxel};

/// Spatial statistics of one species field
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AvgMinMax {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl AvgMinMax {
    fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let (min, max, sum) = values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        );
        Self {
            avg: sum / values.len() as f64,
            min,
            max,
        }
    }
}

/// Compartment layout needed to interpret and draw the snapshots
#[derive(Debug, Clone)]
struct CompartmentLayout {
    id: String,
    species: Vec<String>,
    colours: Vec<[u8; 3]>,
    voxels: Vec<Voxel>,
}

/// Results of a simulation
///
/// Indices: `t` is the time-point index, `compartment` the compartment index
/// in geometry order and `species` the index among the compartment's
/// non-constant species.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    layouts: Vec<CompartmentLayout>,
    image_size: [usize; 3],
    time_points: Vec<f64>,
    /// `[t][compartment]` concentration blocks
    snapshots: Vec<Vec<Vec<f64>>>,
    /// `[t][compartment][species]`
    statistics: Vec<Vec<Vec<AvgMinMax>>>,
    metadata: HashMap<String, String>,
}

impl SimulationResult {
    /// Empty store for `geometry`
    ///
    /// `species[c]` and `colours[c]` list the non-constant species of
    /// compartment `c` and their display colours.
    pub(crate) fn new(geometry: &Geometry, species: Vec<Vec<String>>, colours: Vec<Vec<[u8; 3]>>) -> Self {
        let layouts = geometry
            .compartments()
            .iter()
            .zip(species)
            .zip(colours)
            .map(|((c, species), colours)| CompartmentLayout {
                id: c.id().to_string(),
                species,
                colours,
                voxels: c.voxels().to_vec(),
            })
            .collect();

        Self {
            layouts,
            image_size: geometry.size(),
            time_points: Vec::new(),
            snapshots: Vec::new(),
            statistics: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Append a snapshot taken at `time`
    pub(crate) fn push(&mut self, time: f64, blocks: Vec<Vec<f64>>) {
        let statistics = self
            .layouts
            .iter()
            .zip(&blocks)
            .map(|(layout, block)| {
                let n = layout.voxels.len();
                (0..layout.species.len())
                    .map(|s| AvgMinMax::of(&block[s * n..(s + 1) * n]))
                    .collect()
            })
            .collect();
        self.time_points.push(time);
        self.snapshots.push(blocks);
        self.statistics.push(statistics);
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    pub fn time_points(&self) -> &[f64] {
        &self.time_points
    }

    /// Number of stored time points
    pub fn len(&self) -> usize {
        self.time_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_points.is_empty()
    }

    pub fn compartment_ids(&self) -> Vec<&str> {
        self.layouts.iter().map(|l| l.id.as_str()).collect()
    }

    /// Non-constant species of a compartment
    pub fn species_ids(&self, compartment: usize) -> &[String] {
        self.layouts
            .get(compartment)
            .map(|l| l.species.as_slice())
            .unwrap_or(&[])
    }

    pub fn species_colour(&self, compartment: usize, species: usize) -> Option<[u8; 3]> {
        self.layouts.get(compartment)?.colours.get(species).copied()
    }

    pub fn avg_min_max(&self, t: usize, compartment: usize, species: usize) -> Option<AvgMinMax> {
        self.statistics.get(t)?.get(compartment)?.get(species).copied()
    }

    /// Per-pixel concentration of one species, in compartment pixel order
    pub fn concentration(&self, t: usize, compartment: usize, species: usize) -> Option<&[f64]> {
        let layout = self.layouts.get(compartment)?;
        if species >= layout.species.len() {
            return None;
        }
        let n = layout.voxels.len();
        let block = self.snapshots.get(t)?.get(compartment)?;
        Some(&block[species * n..(species + 1) * n])
    }

    /// RGBA preview of the `z` layer at time point `t`, shape `(height, width, 4)`
    ///
    /// Each field is normalised by its maximum over the compartment and
    /// contributes `1 / n_fields` of its colour. Pixels outside every
    /// compartment are transparent black.
    pub fn concentration_image(&self, t: usize, z: usize) -> Option<Array3<u8>> {
        let blocks = self.snapshots.get(t)?;
        let [width, height, depth] = self.image_size;
        if z >= depth {
            return None;
        }

        let mut image = Array3::<u8>::zeros((height, width, 4));
        for (layout, block) in self.layouts.iter().zip(blocks) {
            let n = layout.voxels.len();
            let n_fields = layout.species.len();
            let alpha = if n_fields > 0 { 1.0 / n_fields as f64 } else { 0.0 };
            let maxima: Vec<f64> = (0..n_fields)
                .map(|f| {
                    let max = block[f * n..(f + 1) * n].iter().copied().fold(0.0, f64::max);
                    if max < 1e-15 { 1.0 } else { max }
                })
                .collect();

            for (ix, voxel) in layout.voxels.iter().enumerate() {
                if voxel.z != z {
                    continue;
                }
                let mut rgb = [0i32; 3];
                for f in 0..n_fields {
                    let scale = alpha * block[f * n + ix] / maxima[f];
                    for (channel, colour) in rgb.iter_mut().zip(layout.colours[f]) {
                        *channel += (colour as f64 * scale) as i32;
                    }
                }
                for (channel, value) in rgb.iter().enumerate() {
                    image[[voxel.y, voxel.x, channel]] = (*value).clamp(0, 255) as u8;
                }
                image[[voxel.y, voxel.x, 3]] = 255;
            }
        }
        Some(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::voxels_in_box;

    fn store() -> SimulationResult {
        let mut g = Geometry::new([3, 2, 1], 1.0).unwrap();
        g.add_compartment("left", voxels_in_box([0, 0, 0], [2, 2, 1])).unwrap();
        SimulationResult::new(
            &g,
            vec![vec!["A".to_string(), "B".to_string()]],
            vec![vec![[255, 0, 0], [0, 0, 200]]],
        )
    }

    #[test]
    fn test_statistics_per_species() {
        let mut r = store();
        r.push(0.0, vec![vec![1.0, 2.0, 3.0, 6.0, 0.0, 0.0, 0.0, 4.0]]);

        assert_eq!(r.len(), 1);
        assert_eq!(
            r.avg_min_max(0, 0, 0),
            Some(AvgMinMax { avg: 3.0, min: 1.0, max: 6.0 })
        );
        assert_eq!(r.avg_min_max(0, 0, 1).map(|s| s.max), Some(4.0));
        assert_eq!(r.concentration(0, 0, 1), Some(&[0.0, 0.0, 0.0, 4.0][..]));
        assert!(r.concentration(0, 0, 2).is_none());
        assert!(r.avg_min_max(1, 0, 0).is_none());
    }

    #[test]
    fn test_image_black_for_zero_concentrations() {
        let mut r = store();
        r.push(0.0, vec![vec![0.0; 8]]);
        let image = r.concentration_image(0, 0).unwrap();

        assert_eq!(image.dim(), (2, 3, 4));
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(image.slice(ndarray::s![y, x, ..]).to_vec(), vec![0, 0, 0, 255]);
            }
            // outside every compartment
            assert_eq!(image.slice(ndarray::s![y, 2, ..]).to_vec(), vec![0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_image_blends_normalised_fields() {
        let mut r = store();
        // A at its max in pixel 0, B at its max in pixel 3
        r.push(0.0, vec![vec![2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0]]);
        let image = r.concentration_image(0, 0).unwrap();

        assert_eq!(image.slice(ndarray::s![0, 0, ..]).to_vec(), vec![127, 0, 0, 255]);
        assert_eq!(image.slice(ndarray::s![0, 1, ..]).to_vec(), vec![63, 0, 0, 255]);
        assert_eq!(image.slice(ndarray::s![1, 1, ..]).to_vec(), vec![0, 0, 100, 255]);
        assert!(r.concentration_image(0, 1).is_none());
    }

    #[test]
    fn test_metadata() {
        let mut r = store();
        r.add_metadata("backend", "Interpreted");
        assert_eq!(r.metadata("backend"), Some("Interpreted"));
        assert_eq!(r.metadata("missing"), None);
        assert_eq!(r.compartment_ids(), vec!["left"]);
        assert_eq!(r.species_colour(0, 1), Some([0, 0, 200]));
    }
}
