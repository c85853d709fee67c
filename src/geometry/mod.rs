//! Segmented pixel/voxel geometry
//!
//! A [`Geometry`] is a regular grid of `width × height × depth` voxels with a
//! physical edge length (`pixel_width`). Some voxels belong to a
//! [`Compartment`]; a [`Membrane`] is the interface between two compartments,
//! stored as the list of face-adjacent pixel pairs that straddle it.
//!
//! # Build order
//!
//! Compartments must be added before the membranes that reference them:
//!
//! ```rust
//! use pixsim_rs::geometry::{Geometry, voxels_in_box};
//!
//! let mut geometry = Geometry::new([4, 1, 1], 1.0)?;
//! geometry.add_compartment("left", voxels_in_box([0, 0, 0], [2, 1, 1]))?;
//! geometry.add_compartment("right", voxels_in_box([2, 0, 0], [4, 1, 1]))?;
//! geometry.add_membrane("left_right", "left", "right")?;
//!
//! assert_eq!(geometry.membranes()[0].pairs(), &[(1, 0)]);
//! # Ok::<(), pixsim_rs::ModelError>(())
//! ```
//!
//! Regions are kept in two arenas and referred to by index; nothing holds a
//! pointer back into the geometry.

use std::collections::HashSet;

use crate::error::ModelError;

/// Face-neighbour offsets, in the order used for neighbour lists and pair derivation
const FACE_OFFSETS: [[isize; 3]; 6] = [
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
];

// =================================================================================================
// Voxel
// =================================================================================================

/// Integer voxel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Voxel {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Voxel {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Voxel in the first layer of a 2D image
    pub const fn xy(x: usize, y: usize) -> Self {
        Self { x, y, z: 0 }
    }

    /// Whether `other` shares a face with `self`
    pub fn is_face_adjacent(&self, other: &Voxel) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx + dy + dz == 1
    }

    fn offset(&self, delta: [isize; 3], size: [usize; 3]) -> Option<Voxel> {
        let x = self.x.checked_add_signed(delta[0])?;
        let y = self.y.checked_add_signed(delta[1])?;
        let z = self.z.checked_add_signed(delta[2])?;
        (x < size[0] && y < size[1] && z < size[2]).then_some(Voxel { x, y, z })
    }
}

/// All voxels of the half-open box `[min, max)`, x fastest then y then z
pub fn voxels_in_box(min: [usize; 3], max: [usize; 3]) -> Vec<Voxel> {
    let mut voxels = Vec::new();
    for z in min[2]..max[2] {
        for y in min[1]..max[1] {
            for x in min[0]..max[0] {
                voxels.push(Voxel { x, y, z });
            }
        }
    }
    voxels
}

// =================================================================================================
// Regions
// =================================================================================================

/// Ordered set of voxels sharing one set of species
///
/// The position of a voxel in [`voxels()`](Compartment::voxels) is its pixel
/// index `ix`, which is how every species field of the compartment is indexed.
#[derive(Debug, Clone)]
pub struct Compartment {
    id: String,
    voxels: Vec<Voxel>,
    neighbour_offsets: Vec<usize>,
    neighbours: Vec<usize>,
}

impl Compartment {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn n_pixels(&self) -> usize {
        self.voxels.len()
    }

    /// Pixel indices of the same-compartment face neighbours of pixel `ix`
    pub fn neighbours(&self, ix: usize) -> &[usize] {
        &self.neighbours[self.neighbour_offsets[ix]..self.neighbour_offsets[ix + 1]]
    }
}

/// Interface between compartments A and B
#[derive(Debug, Clone)]
pub struct Membrane {
    id: String,
    compartment_a: usize,
    compartment_b: usize,
    pairs: Vec<(usize, usize)>,
}

impl Membrane {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Index of compartment A in [`Geometry::compartments`]
    pub fn compartment_a(&self) -> usize {
        self.compartment_a
    }

    /// Index of compartment B in [`Geometry::compartments`]
    pub fn compartment_b(&self) -> usize {
        self.compartment_b
    }

    /// `(ixA, ixB)` pixel pairs straddling the membrane
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }
}

// =================================================================================================
// Geometry
// =================================================================================================

/// Voxel grid with its compartments and membranes
#[derive(Debug, Clone)]
pub struct Geometry {
    size: [usize; 3],
    pixel_width: f64,
    /// Per grid voxel: owning compartment and pixel index inside it
    labels: Vec<Option<(usize, usize)>>,
    compartments: Vec<Compartment>,
    membranes: Vec<Membrane>,
}

impl Geometry {
    /// Create an empty geometry of `[width, height, depth]` voxels
    ///
    /// Use a depth of 1 for 2D images.
    pub fn new(size: [usize; 3], pixel_width: f64) -> Result<Self, ModelError> {
        if size.iter().any(|&n| n == 0) {
            return Err(ModelError::InvalidGeometry(format!(
                "every dimension must be at least 1, got {:?}",
                size
            )));
        }
        if !(pixel_width.is_finite() && pixel_width > 0.0) {
            return Err(ModelError::InvalidGeometry(format!(
                "pixel width must be positive and finite, got {}",
                pixel_width
            )));
        }
        Ok(Self {
            size,
            pixel_width,
            labels: vec![None; size[0] * size[1] * size[2]],
            compartments: Vec::new(),
            membranes: Vec::new(),
        })
    }

    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    /// 3 when the grid has more than one layer, 2 otherwise
    pub fn dimension(&self) -> usize {
        if self.size[2] > 1 { 3 } else { 2 }
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn membranes(&self) -> &[Membrane] {
        &self.membranes
    }

    pub fn compartment_index(&self, id: &str) -> Option<usize> {
        self.compartments.iter().position(|c| c.id == id)
    }

    pub fn membrane_index(&self, id: &str) -> Option<usize> {
        self.membranes.iter().position(|m| m.id == id)
    }

    /// Compartment and pixel index of the voxel, if it belongs to one
    pub fn label(&self, voxel: Voxel) -> Option<(usize, usize)> {
        if voxel.x >= self.size[0] || voxel.y >= self.size[1] || voxel.z >= self.size[2] {
            return None;
        }
        self.labels[self.linear_index(voxel)]
    }

    fn linear_index(&self, voxel: Voxel) -> usize {
        voxel.x + self.size[0] * (voxel.y + self.size[1] * voxel.z)
    }

    fn check_new_id(&self, id: &str) -> Result<(), ModelError> {
        let taken = self.compartments.iter().any(|c| c.id == id)
            || self.membranes.iter().any(|m| m.id == id);
        if taken {
            return Err(ModelError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    /// Add a compartment made of `voxels`, in the given pixel order
    ///
    /// Returns the index of the new compartment.
    pub fn add_compartment(&mut self, id: &str, voxels: Vec<Voxel>) -> Result<usize, ModelError> {
        self.check_new_id(id)?;

        let index = self.compartments.len();
        let mut seen = HashSet::with_capacity(voxels.len());
        for voxel in &voxels {
            if voxel.x >= self.size[0] || voxel.y >= self.size[1] || voxel.z >= self.size[2] {
                return Err(ModelError::VoxelOutOfBounds {
                    compartment: id.to_string(),
                    x: voxel.x,
                    y: voxel.y,
                    z: voxel.z,
                });
            }
            let owner = self.labels[self.linear_index(*voxel)]
                .map(|(c, _)| self.compartments[c].id.clone());
            if owner.is_some() || !seen.insert(*voxel) {
                return Err(ModelError::OverlappingVoxel {
                    first: owner.unwrap_or_else(|| id.to_string()),
                    second: id.to_string(),
                    x: voxel.x,
                    y: voxel.y,
                    z: voxel.z,
                });
            }
        }

        for (ix, voxel) in voxels.iter().enumerate() {
            let linear = self.linear_index(*voxel);
            self.labels[linear] = Some((index, ix));
        }

        // CSR neighbour lists restricted to this compartment
        let mut neighbour_offsets = Vec::with_capacity(voxels.len() + 1);
        let mut neighbours = Vec::with_capacity(voxels.len() * 2 * self.dimension());
        neighbour_offsets.push(0);
        for voxel in &voxels {
            for delta in FACE_OFFSETS {
                if let Some(n) = voxel.offset(delta, self.size)
                    && let Some((c, ix)) = self.labels[self.linear_index(n)]
                    && c == index
                {
                    neighbours.push(ix);
                }
            }
            neighbour_offsets.push(neighbours.len());
        }

        log::debug!("compartment '{}': {} pixels", id, voxels.len());

        self.compartments.push(Compartment {
            id: id.to_string(),
            voxels,
            neighbour_offsets,
            neighbours,
        });
        Ok(index)
    }

    fn resolve_pair(&self, id: &str, compartment_a: &str, compartment_b: &str) -> Result<(usize, usize), ModelError> {
        self.check_new_id(id)?;
        let a = self
            .compartment_index(compartment_a)
            .ok_or_else(|| ModelError::UnknownCompartment(compartment_a.to_string()))?;
        let b = self
            .compartment_index(compartment_b)
            .ok_or_else(|| ModelError::UnknownCompartment(compartment_b.to_string()))?;
        if a == b {
            return Err(ModelError::SelfMembrane(id.to_string()));
        }
        Ok((a, b))
    }

    /// Add a membrane between two compartments, deriving its pixel pairs
    ///
    /// Pairs are listed in pixel order of compartment A, and for each pixel in
    /// the fixed face order (-x, +x, -y, +y, -z, +z). Two compartments that do
    /// not touch give a membrane without pairs.
    pub fn add_membrane(&mut self, id: &str, compartment_a: &str, compartment_b: &str) -> Result<usize, ModelError> {
        let (a, b) = self.resolve_pair(id, compartment_a, compartment_b)?;

        let mut pairs = Vec::new();
        for (ix_a, voxel) in self.compartments[a].voxels.iter().enumerate() {
            for delta in FACE_OFFSETS {
                if let Some(n) = voxel.offset(delta, self.size)
                    && let Some((c, ix_b)) = self.labels[self.linear_index(n)]
                    && c == b
                {
                    pairs.push((ix_a, ix_b));
                }
            }
        }

        log::debug!(
            "membrane '{}' ({} | {}): {} pixel pairs",
            id,
            compartment_a,
            compartment_b,
            pairs.len()
        );

        self.membranes.push(Membrane {
            id: id.to_string(),
            compartment_a: a,
            compartment_b: b,
            pairs,
        });
        Ok(self.membranes.len() - 1)
    }

    /// Add a membrane with an explicit pixel-pair list
    ///
    /// Every pair must reference existing pixels that share a face.
    pub fn add_membrane_with_pairs(
        &mut self,
        id: &str,
        compartment_a: &str,
        compartment_b: &str,
        pairs: Vec<(usize, usize)>,
    ) -> Result<usize, ModelError> {
        let (a, b) = self.resolve_pair(id, compartment_a, compartment_b)?;
        let voxels_a = &self.compartments[a].voxels;
        let voxels_b = &self.compartments[b].voxels;

        for &(ix_a, ix_b) in &pairs {
            let adjacent = match (voxels_a.get(ix_a), voxels_b.get(ix_b)) {
                (Some(va), Some(vb)) => va.is_face_adjacent(vb),
                _ => false,
            };
            if !adjacent {
                return Err(ModelError::NotAdjacent {
                    membrane: id.to_string(),
                    ix_a,
                    ix_b,
                });
            }
        }

        self.membranes.push(Membrane {
            id: id.to_string(),
            compartment_a: a,
            compartment_b: b,
            pairs,
        });
        Ok(self.membranes.len() - 1)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn column() -> Geometry {
        let mut g = Geometry::new([1, 3, 1], 1.0).unwrap();
        g.add_compartment("c1", vec![Voxel::xy(0, 0)]).unwrap();
        g.add_compartment("c2", vec![Voxel::xy(0, 1)]).unwrap();
        g.add_compartment("c3", vec![Voxel::xy(0, 2)]).unwrap();
        g
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        assert!(matches!(
            Geometry::new([0, 3, 1], 1.0),
            Err(ModelError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Geometry::new([3, 3, 1], -1.0),
            Err(ModelError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_voxels_in_box_order() {
        let voxels = voxels_in_box([0, 0, 0], [2, 2, 1]);
        assert_eq!(
            voxels,
            vec![Voxel::xy(0, 0), Voxel::xy(1, 0), Voxel::xy(0, 1), Voxel::xy(1, 1)]
        );
    }

    #[test]
    fn test_neighbours_2d_square() {
        let mut g = Geometry::new([3, 3, 1], 1.0).unwrap();
        g.add_compartment("cell", voxels_in_box([0, 0, 0], [3, 3, 1])).unwrap();
        let cell = &g.compartments()[0];

        // corner, edge and centre pixels
        assert_eq!(cell.neighbours(0).len(), 2);
        assert_eq!(cell.neighbours(1).len(), 3);
        assert_eq!(cell.neighbours(4), &[3, 5, 1, 7]);
    }

    #[test]
    fn test_neighbours_3d_cube_centre_has_six() {
        let mut g = Geometry::new([3, 3, 3], 0.5).unwrap();
        g.add_compartment("cube", voxels_in_box([0, 0, 0], [3, 3, 3])).unwrap();
        assert_eq!(g.dimension(), 3);
        assert_eq!(g.compartments()[0].neighbours(13).len(), 6);
    }

    #[test]
    fn test_neighbours_stop_at_compartment_edge() {
        let mut g = Geometry::new([2, 1, 1], 1.0).unwrap();
        g.add_compartment("a", vec![Voxel::xy(0, 0)]).unwrap();
        g.add_compartment("b", vec![Voxel::xy(1, 0)]).unwrap();
        assert!(g.compartments()[0].neighbours(0).is_empty());
        assert!(g.compartments()[1].neighbours(0).is_empty());
    }

    #[test]
    fn test_membrane_pairs_derived_from_adjacency() {
        let mut g = column();
        g.add_membrane("c1_c2_membrane", "c1", "c2").unwrap();
        g.add_membrane("c2_c3_membrane", "c2", "c3").unwrap();
        assert_eq!(g.membranes()[0].pairs(), &[(0, 0)]);
        assert_eq!(g.membranes()[1].compartment_a(), 1);
        assert_eq!(g.membranes()[1].compartment_b(), 2);
    }

    #[test]
    fn test_membrane_between_distant_compartments_is_empty() {
        let mut g = column();
        g.add_membrane("c1_c3_membrane", "c1", "c3").unwrap();
        assert!(g.membranes()[0].pairs().is_empty());
    }

    #[test]
    fn test_membrane_unknown_compartment() {
        let mut g = column();
        let err = g.add_membrane("m", "c1", "nucleus").unwrap_err();
        assert!(matches!(err, ModelError::UnknownCompartment(ref id) if id == "nucleus"));
    }

    #[test]
    fn test_membrane_to_itself_rejected() {
        let mut g = column();
        assert!(matches!(
            g.add_membrane("m", "c1", "c1"),
            Err(ModelError::SelfMembrane(_))
        ));
    }

    #[test]
    fn test_explicit_pairs_must_be_adjacent() {
        let mut g = column();
        let err = g
            .add_membrane_with_pairs("m", "c1", "c3", vec![(0, 0)])
            .unwrap_err();
        assert!(matches!(err, ModelError::NotAdjacent { .. }));

        let ok = g.add_membrane_with_pairs("m", "c1", "c2", vec![(0, 0)]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_overlap_and_bounds_detected() {
        let mut g = column();
        assert!(matches!(
            g.add_compartment("c4", vec![Voxel::xy(0, 1)]),
            Err(ModelError::OverlappingVoxel { .. })
        ));
        assert!(matches!(
            g.add_compartment("c5", vec![Voxel::xy(3, 0)]),
            Err(ModelError::VoxelOutOfBounds { .. })
        ));
        assert!(matches!(
            g.add_compartment("c2", vec![]),
            Err(ModelError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_label_lookup() {
        let g = column();
        assert_eq!(g.label(Voxel::xy(0, 2)), Some((2, 0)));
        assert_eq!(g.label(Voxel::xy(5, 5)), None);
    }
}
