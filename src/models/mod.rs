//! Reaction-diffusion model definitions
//!
//! A [`ModelDef`] is the read-only description a simulation is built from:
//! species living in compartments, reactions living in compartments or
//! membranes, and global parameters. It carries no numerics; turning it into
//! rate evaluators happens in [`physics`](crate::physics).
//!
//! # Available definitions
//!
//! | Type | Describes |
//! |------|-----------|
//! | [`SpeciesDef`] | one species field: compartment, diffusion, flags, initial value, colour |
//! | [`ReactionDef`] | one reaction: location, stoichiometry, rate law, local parameters |
//! | [`ModelDef`] | the whole network plus global parameters |
//!
//! Ready-made models with matching geometries live in [`library`].

pub mod library;
pub mod rhs;

use std::collections::HashSet;

use crate::error::ModelError;
use crate::geometry::Geometry;

/// Colours handed to species that do not set one
const DEFAULT_COLOURS: [[u8; 3]; 8] = [
    [230, 25, 75],
    [60, 180, 75],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
    [210, 245, 60],
];

// =================================================================================================
// Species
// =================================================================================================

/// Initial concentration of a species field
#[derive(Debug, Clone, PartialEq)]
pub enum InitialConcentration {
    /// Same value in every pixel
    Uniform(f64),
    /// One value per pixel, in compartment pixel order
    Field(Vec<f64>),
}

impl InitialConcentration {
    /// The single value of a uniform (or constant-valued) field
    pub fn uniform_value(&self) -> Option<f64> {
        match self {
            InitialConcentration::Uniform(c) => Some(*c),
            InitialConcentration::Field(values) => {
                let first = *values.first()?;
                values.iter().all(|&v| v == first).then_some(first)
            }
        }
    }
}

/// One chemical species
#[derive(Debug, Clone)]
pub struct SpeciesDef {
    pub id: String,
    pub compartment: String,
    pub diffusion_constant: f64,
    /// Spatial fields diffuse; non-spatial ones are kept well mixed
    pub is_spatial: bool,
    /// Constant species are not integrated; their value is a named constant
    pub is_constant: bool,
    pub initial: InitialConcentration,
    pub colour: Option<[u8; 3]>,
}

impl SpeciesDef {
    /// Spatial, non-constant species with zero diffusion and concentration
    pub fn new(id: &str, compartment: &str) -> Self {
        Self {
            id: id.to_string(),
            compartment: compartment.to_string(),
            diffusion_constant: 0.0,
            is_spatial: true,
            is_constant: false,
            initial: InitialConcentration::Uniform(0.0),
            colour: None,
        }
    }

    pub fn diffusion(mut self, diffusion_constant: f64) -> Self {
        self.diffusion_constant = diffusion_constant;
        self
    }

    pub fn non_spatial(mut self) -> Self {
        self.is_spatial = false;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }

    pub fn initial(mut self, concentration: f64) -> Self {
        self.initial = InitialConcentration::Uniform(concentration);
        self
    }

    pub fn initial_field(mut self, values: Vec<f64>) -> Self {
        self.initial = InitialConcentration::Field(values);
        self
    }

    pub fn colour(mut self, rgb: [u8; 3]) -> Self {
        self.colour = Some(rgb);
        self
    }

    /// Check that the parameters are physically meaningful
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("Species id must not be empty".to_string());
        }
        if !self.diffusion_constant.is_finite() || self.diffusion_constant < 0.0 {
            return Err(format!(
                "Species '{}' : diffusion constant must be finite and non-negative, got {}",
                self.id, self.diffusion_constant
            ));
        }
        let finite = match &self.initial {
            InitialConcentration::Uniform(c) => c.is_finite(),
            InitialConcentration::Field(values) => values.iter().all(|c| c.is_finite()),
        };
        if !finite {
            return Err(format!(
                "Species '{}' : initial concentration must be finite",
                self.id
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Reactions
// =================================================================================================

/// One reaction with a rate law
#[derive(Debug, Clone)]
pub struct ReactionDef {
    pub id: String,
    /// Compartment or membrane id
    pub location: String,
    /// `(species, coefficient)`: negative for reactants, positive for products
    pub stoichiometry: Vec<(String, f64)>,
    pub rate: String,
    /// Local parameters, inlined into `rate` before compilation
    pub parameters: Vec<(String, f64)>,
}

impl ReactionDef {
    pub fn new(id: &str, location: &str, rate: &str) -> Self {
        Self {
            id: id.to_string(),
            location: location.to_string(),
            stoichiometry: Vec::new(),
            rate: rate.to_string(),
            parameters: Vec::new(),
        }
    }

    pub fn reactant(mut self, species: &str, count: f64) -> Self {
        self.stoichiometry.push((species.to_string(), -count));
        self
    }

    pub fn product(mut self, species: &str, count: f64) -> Self {
        self.stoichiometry.push((species.to_string(), count));
        self
    }

    pub fn parameter(mut self, name: &str, value: f64) -> Self {
        self.parameters.push((name.to_string(), value));
        self
    }

    /// Net stoichiometric coefficient of `species`
    pub fn coefficient(&self, species: &str) -> f64 {
        self.stoichiometry
            .iter()
            .filter(|(s, _)| s == species)
            .map(|(_, n)| n)
            .sum()
    }
}

// =================================================================================================
// Model
// =================================================================================================

/// Complete reaction-diffusion model
#[derive(Debug, Clone, Default)]
pub struct ModelDef {
    pub name: String,
    pub species: Vec<SpeciesDef>,
    pub reactions: Vec<ReactionDef>,
    pub parameters: Vec<(String, f64)>,
}

impl ModelDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_species(&mut self, species: SpeciesDef) -> &mut Self {
        self.species.push(species);
        self
    }

    pub fn add_reaction(&mut self, reaction: ReactionDef) -> &mut Self {
        self.reactions.push(reaction);
        self
    }

    pub fn add_parameter(&mut self, name: &str, value: f64) -> &mut Self {
        self.parameters.push((name.to_string(), value));
        self
    }

    pub fn species(&self, id: &str) -> Option<&SpeciesDef> {
        self.species.iter().find(|s| s.id == id)
    }

    /// Non-constant species of `compartment`, in definition order
    pub fn field_species(&self, compartment: &str) -> Vec<&SpeciesDef> {
        self.species
            .iter()
            .filter(|s| s.compartment == compartment && !s.is_constant)
            .collect()
    }

    /// Reactions located in `region`, in definition order
    pub fn reactions_in(&self, region: &str) -> Vec<&ReactionDef> {
        self.reactions.iter().filter(|r| r.location == region).collect()
    }

    /// Display colour of the species, falling back to a fixed palette
    pub fn species_colour(&self, id: &str) -> [u8; 3] {
        let index = self.species.iter().position(|s| s.id == id).unwrap_or(0);
        self.species
            .get(index)
            .and_then(|s| s.colour)
            .unwrap_or(DEFAULT_COLOURS[index % DEFAULT_COLOURS.len()])
    }

    /// Named constants visible to every rate law
    ///
    /// Global parameters followed by the values of constant species.
    pub fn constants(&self) -> Result<Vec<(String, f64)>, ModelError> {
        let mut constants = self.parameters.clone();
        for species in self.species.iter().filter(|s| s.is_constant) {
            let value = species
                .initial
                .uniform_value()
                .ok_or_else(|| ModelError::NonUniformConstant(species.id.clone()))?;
            constants.push((species.id.clone(), value));
        }
        Ok(constants)
    }

    /// Check the model against a geometry
    ///
    /// Detects every structural inconsistency before any stepper is built:
    /// duplicate ids, species in unknown compartments, wrongly sized initial
    /// fields, reactions in unknown regions or using species that are not
    /// available where the reaction happens.
    pub fn validate(&self, geometry: &Geometry) -> Result<(), ModelError> {
        let mut ids = HashSet::new();
        for species in &self.species {
            if !ids.insert(species.id.as_str()) {
                return Err(ModelError::DuplicateId(species.id.clone()));
            }
            species.validate().map_err(|reason| ModelError::InvalidSpecies {
                species: species.id.clone(),
                reason,
            })?;
            let compartment = geometry
                .compartment_index(&species.compartment)
                .ok_or_else(|| ModelError::UnknownCompartment(species.compartment.clone()))?;

            if let InitialConcentration::Field(values) = &species.initial {
                let expected = geometry.compartments()[compartment].n_pixels();
                if values.len() != expected {
                    return Err(ModelError::InitialFieldLength {
                        species: species.id.clone(),
                        expected,
                        actual: values.len(),
                    });
                }
            }
        }

        // constant species must be representable as a single named value
        self.constants()?;

        let mut reaction_ids = HashSet::new();
        for reaction in &self.reactions {
            if !reaction_ids.insert(reaction.id.as_str()) {
                return Err(ModelError::DuplicateId(reaction.id.clone()));
            }

            let compartments: Vec<&str> = if geometry.compartment_index(&reaction.location).is_some() {
                vec![reaction.location.as_str()]
            } else if let Some(m) = geometry.membrane_index(&reaction.location) {
                let membrane = &geometry.membranes()[m];
                vec![
                    geometry.compartments()[membrane.compartment_a()].id(),
                    geometry.compartments()[membrane.compartment_b()].id(),
                ]
            } else {
                return Err(ModelError::UnknownLocation {
                    reaction: reaction.id.clone(),
                    location: reaction.location.clone(),
                });
            };

            for (species_id, _) in &reaction.stoichiometry {
                let available = self
                    .species(species_id)
                    .is_some_and(|s| compartments.contains(&s.compartment.as_str()));
                if !available {
                    return Err(ModelError::SpeciesNotInRegion {
                        reaction: reaction.id.clone(),
                        species: species_id.clone(),
                        region: reaction.location.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{voxels_in_box, Voxel};

    fn two_cells() -> Geometry {
        let mut g = Geometry::new([2, 1, 1], 1.0).unwrap();
        g.add_compartment("a", vec![Voxel::xy(0, 0)]).unwrap();
        g.add_compartment("b", vec![Voxel::xy(1, 0)]).unwrap();
        g.add_membrane("a_b", "a", "b").unwrap();
        g
    }

    fn transport_model() -> ModelDef {
        let mut model = ModelDef::new("transport");
        model
            .add_species(SpeciesDef::new("X_a", "a").initial(1.0))
            .add_species(SpeciesDef::new("X_b", "b"))
            .add_reaction(
                ReactionDef::new("t", "a_b", "k * X_a")
                    .reactant("X_a", 1.0)
                    .product("X_b", 1.0)
                    .parameter("k", 0.5),
            );
        model
    }

    #[test]
    fn test_valid_model_passes() {
        assert!(transport_model().validate(&two_cells()).is_ok());
    }

    #[test]
    fn test_species_in_unknown_compartment() {
        let mut model = transport_model();
        model.add_species(SpeciesDef::new("Y", "nucleus"));
        assert!(matches!(
            model.validate(&two_cells()),
            Err(ModelError::UnknownCompartment(ref c)) if c == "nucleus"
        ));
    }

    #[test]
    fn test_reaction_in_unknown_location() {
        let mut model = transport_model();
        model.add_reaction(ReactionDef::new("r", "nowhere", "1"));
        assert!(matches!(
            model.validate(&two_cells()),
            Err(ModelError::UnknownLocation { .. })
        ));
    }

    #[test]
    fn test_reaction_species_outside_region() {
        let mut model = transport_model();
        model.add_reaction(ReactionDef::new("r", "a", "1").product("X_b", 1.0));
        assert!(matches!(
            model.validate(&two_cells()),
            Err(ModelError::SpeciesNotInRegion { ref species, .. }) if species == "X_b"
        ));
    }

    #[test]
    fn test_duplicate_species_id() {
        let mut model = transport_model();
        model.add_species(SpeciesDef::new("X_a", "b"));
        assert!(matches!(
            model.validate(&two_cells()),
            Err(ModelError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_initial_field_length_checked() {
        let mut g = Geometry::new([3, 1, 1], 1.0).unwrap();
        g.add_compartment("row", voxels_in_box([0, 0, 0], [3, 1, 1])).unwrap();
        let mut model = ModelDef::new("m");
        model.add_species(SpeciesDef::new("C", "row").initial_field(vec![1.0, 2.0]));
        assert!(matches!(
            model.validate(&g),
            Err(ModelError::InitialFieldLength { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_negative_diffusion_rejected() {
        let mut model = transport_model();
        model.species[1].diffusion_constant = -1.0;
        let err = model.validate(&two_cells()).unwrap_err();
        assert!(err.to_string().contains("diffusion constant"));
    }

    #[test]
    fn test_constants_include_constant_species() {
        let mut model = transport_model();
        model.add_parameter("V", 2.0);
        model.add_species(SpeciesDef::new("S", "a").constant().initial(3.0));
        let constants = model.constants().unwrap();
        assert_eq!(constants, vec![("V".to_string(), 2.0), ("S".to_string(), 3.0)]);
    }

    #[test]
    fn test_non_uniform_constant_rejected() {
        let mut model = transport_model();
        model.add_species(SpeciesDef::new("S", "a").constant().initial_field(vec![1.0]));
        assert!(model.constants().is_ok());

        model.species[2].initial = InitialConcentration::Field(vec![]);
        assert!(matches!(model.constants(), Err(ModelError::NonUniformConstant(_))));
    }

    #[test]
    fn test_field_species_excludes_constants() {
        let mut model = transport_model();
        model.add_species(SpeciesDef::new("S", "a").constant());
        let ids: Vec<&str> = model.field_species("a").iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["X_a"]);
    }

    #[test]
    fn test_coefficient_sums_duplicates() {
        let reaction = ReactionDef::new("r", "a", "X")
            .reactant("X", 2.0)
            .product("X", 3.0);
        assert_eq!(reaction.coefficient("X"), 1.0);
        assert_eq!(reaction.coefficient("Y"), 0.0);
    }

    #[test]
    fn test_species_colour_fallback() {
        let mut model = transport_model();
        model.species[0].colour = Some([1, 2, 3]);
        assert_eq!(model.species_colour("X_a"), [1, 2, 3]);
        assert_eq!(model.species_colour("X_b"), DEFAULT_COLOURS[1]);
    }
}
