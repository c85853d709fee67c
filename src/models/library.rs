//! Built-in demo models
//!
//! Each constructor returns a model together with the geometry it was
//! written for. They back the `pixsim` binary, the benchmarks and a good share
//! of the integration tests.

use crate::error::ModelError;
use crate::geometry::{voxels_in_box, Geometry, Voxel};

use super::{ModelDef, ReactionDef, SpeciesDef};

/// Three stacked unit pixels `c1 | c2 | c3` with membrane transport
///
/// `A` enters from the constant pool in `c1`, is converted to `B` in `c3`, and
/// `B` is carried back to `c1` where it accumulates.
///
/// Steady state: `A_c2 = 4/7`, `A_c3 = 1/7`, `B_c2 = B_c3 = 3/14`, and `B_c1`
/// grows at `0.3/7` per unit time.
pub fn very_simple_model() -> Result<(ModelDef, Geometry), ModelError> {
    let mut geometry = Geometry::new([1, 3, 1], 1.0)?;
    geometry.add_compartment("c1", vec![Voxel::xy(0, 0)])?;
    geometry.add_compartment("c2", vec![Voxel::xy(0, 1)])?;
    geometry.add_compartment("c3", vec![Voxel::xy(0, 2)])?;
    geometry.add_membrane("c1_c2", "c1", "c2")?;
    geometry.add_membrane("c2_c3", "c2", "c3")?;

    let mut model = ModelDef::new("very-simple");
    model
        .add_species(SpeciesDef::new("A_c1", "c1").constant().initial(1.0))
        .add_species(SpeciesDef::new("B_c1", "c1").colour([0, 0, 255]))
        .add_species(SpeciesDef::new("A_c2", "c2").colour([255, 0, 0]))
        .add_species(SpeciesDef::new("B_c2", "c2").colour([0, 0, 255]))
        .add_species(SpeciesDef::new("A_c3", "c3").colour([255, 0, 0]))
        .add_species(SpeciesDef::new("B_c3", "c3").colour([0, 0, 255]));

    model
        .add_reaction(
            ReactionDef::new("A_uptake", "c1_c2", "k1 * (A_c1 - A_c2)")
                .product("A_c2", 1.0)
                .parameter("k1", 0.1),
        )
        .add_reaction(
            ReactionDef::new("A_transport", "c2_c3", "k1 * (A_c2 - A_c3)")
                .reactant("A_c2", 1.0)
                .product("A_c3", 1.0)
                .parameter("k1", 0.1),
        )
        .add_reaction(
            ReactionDef::new("A_to_B", "c3", "k1 * A_c3")
                .reactant("A_c3", 1.0)
                .product("B_c3", 1.0)
                .parameter("k1", 0.3),
        )
        .add_reaction(
            ReactionDef::new("B_transport", "c2_c3", "k1 * B_c3")
                .reactant("B_c3", 1.0)
                .product("B_c2", 1.0)
                .parameter("k1", 0.2),
        )
        .add_reaction(
            ReactionDef::new("B_excretion", "c1_c2", "k1 * B_c2")
                .reactant("B_c2", 1.0)
                .product("B_c1", 1.0)
                .parameter("k1", 0.2),
        );

    Ok((model, geometry))
}

/// Brusselator oscillator in a well-mixed square cell
///
/// `X' = a - (b + 1) X + X² Y`, `Y' = b X - X² Y` with `a = 1`, `b = 1.7`.
/// Both fields start uniform, so every pixel follows the same trajectory.
pub fn brusselator() -> Result<(ModelDef, Geometry), ModelError> {
    let mut geometry = Geometry::new([4, 4, 1], 1.0)?;
    geometry.add_compartment("cell", voxels_in_box([0, 0, 0], [4, 4, 1]))?;

    let mut model = ModelDef::new("brusselator");
    model.add_parameter("a", 1.0).add_parameter("b", 1.7);
    model
        .add_species(SpeciesDef::new("X", "cell").diffusion(0.1).initial(1.2).colour([230, 25, 75]))
        .add_species(SpeciesDef::new("Y", "cell").diffusion(0.1).initial(3.1).colour([0, 130, 200]));

    model
        .add_reaction(ReactionDef::new("feed", "cell", "a").product("X", 1.0))
        .add_reaction(ReactionDef::new("convert", "cell", "b * X").reactant("X", 1.0).product("Y", 1.0))
        .add_reaction(
            ReactionDef::new("autocatalysis", "cell", "X^2 * Y")
                .reactant("X", 2.0)
                .reactant("Y", 1.0)
                .product("X", 3.0),
        )
        .add_reaction(ReactionDef::new("decay", "cell", "X").reactant("X", 1.0));

    Ok((model, geometry))
}

/// Spot of concentration 100 in the centre of an `n × n` square
pub fn diffusion_spot(n: usize) -> Result<(ModelDef, Geometry), ModelError> {
    let mut geometry = Geometry::new([n, n, 1], 1.0)?;
    let voxels = voxels_in_box([0, 0, 0], [n, n, 1]);
    let centre = voxels.iter().position(|v| v.x == n / 2 && v.y == n / 2).unwrap_or(0);
    let mut field = vec![0.0; voxels.len()];
    field[centre] = 100.0;
    geometry.add_compartment("square", voxels)?;

    let mut model = ModelDef::new("diffusion");
    model.add_species(
        SpeciesDef::new("C", "square")
            .diffusion(1.0)
            .initial_field(field)
            .colour([60, 180, 75]),
    );

    Ok((model, geometry))
}

/// Spot of concentration 100 in the centre of an `n × n × n` cube
pub fn diffusion_cube(n: usize) -> Result<(ModelDef, Geometry), ModelError> {
    let mut geometry = Geometry::new([n, n, n], 1.0)?;
    let voxels = voxels_in_box([0, 0, 0], [n, n, n]);
    let centre = voxels
        .iter()
        .position(|v| v.x == n / 2 && v.y == n / 2 && v.z == n / 2)
        .unwrap_or(0);
    let mut field = vec![0.0; voxels.len()];
    field[centre] = 100.0;
    geometry.add_compartment("cube", voxels)?;

    let mut model = ModelDef::new("diffusion3d");
    model.add_species(
        SpeciesDef::new("C", "cube")
            .diffusion(1.0)
            .initial_field(field)
            .colour([245, 130, 48]),
    );

    Ok((model, geometry))
}
