//! Small models exercising specific stepper paths

#![allow(dead_code)]

use pixsim_rs::geometry::voxels_in_box;
use pixsim_rs::prelude::*;

/// 3 x 1 cell with a spatial source field `S` feeding a non-spatial `N`
///
/// `S` does not diffuse, so the production of `N` differs per pixel until it
/// is averaged.
pub fn mixed_spatial_model() -> (ModelDef, Geometry) {
    let mut geometry = Geometry::new([3, 1, 1], 1.0).unwrap();
    geometry.add_compartment("cell", voxels_in_box([0, 0, 0], [3, 1, 1])).unwrap();

    let mut model = ModelDef::new("mixed");
    model
        .add_species(SpeciesDef::new("S", "cell").initial_field(vec![1.0, 2.0, 6.0]))
        .add_species(SpeciesDef::new("N", "cell").non_spatial().diffusion(5.0))
        .add_reaction(ReactionDef::new("produce", "cell", "k * S").product("N", 1.0).parameter("k", 0.5))
        .add_reaction(ReactionDef::new("consume", "cell", "N * S").reactant("S", 1.0));
    (model, geometry)
}

/// Two compartments separated by an empty column, joined by a pair-less membrane
pub fn empty_membrane_model() -> (ModelDef, Geometry) {
    let mut geometry = separated_cells();
    geometry.add_membrane("left_right", "left", "right").unwrap();

    let mut model = ModelDef::new("empty-membrane");
    model
        .add_species(SpeciesDef::new("A_left", "left").initial(1.0))
        .add_species(SpeciesDef::new("A_right", "right"))
        .add_reaction(
            ReactionDef::new("leak", "left_right", "10 * A_left")
                .reactant("A_left", 1.0)
                .product("A_right", 1.0),
        )
        .add_reaction(ReactionDef::new("decay", "left", "0.5 * A_left").reactant("A_left", 1.0));
    (model, geometry)
}

/// 5 x 2 image: `left` in column 0, `right` in columns 2-4
pub fn separated_cells() -> Geometry {
    let mut geometry = Geometry::new([5, 2, 1], 1.0).unwrap();
    geometry.add_compartment("left", voxels_in_box([0, 0, 0], [1, 2, 1])).unwrap();
    geometry.add_compartment("right", voxels_in_box([2, 0, 0], [5, 2, 1])).unwrap();
    geometry
}

/// One pixel whose only species decays at an absurd rate
pub fn stiff_pixel_model() -> (ModelDef, Geometry) {
    let mut geometry = Geometry::new([1, 1, 1], 1.0).unwrap();
    geometry.add_compartment("cell", voxels_in_box([0, 0, 0], [1, 1, 1])).unwrap();

    let mut model = ModelDef::new("stiff");
    model
        .add_species(SpeciesDef::new("A", "cell").initial(1.0))
        .add_reaction(ReactionDef::new("collapse", "cell", "1e300 * A").reactant("A", 1.0));
    (model, geometry)
}
