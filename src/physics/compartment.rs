//! Reaction stepper for the pixels of one compartment

use std::ops::Range;

use crate::error::ModelError;
use crate::geometry::Compartment;
use crate::models::ModelDef;

use super::diffusion::DiffusionOperator;
use super::expression::MathBackend;
use super::reaction_set::ReactionSet;

/// Fields, diffusion and reactions of one compartment
///
/// Owns a contiguous block of the simulation state: `n_fields` runs of
/// `n_pixels` values each, in species order.
#[derive(Debug)]
pub struct CompartmentStepper {
    id: String,
    n_pixels: usize,
    fields: Vec<String>,
    non_spatial: Vec<usize>,
    range: Range<usize>,
    diffusion: DiffusionOperator,
    reactions: ReactionSet,
}

impl CompartmentStepper {
    /// Build the stepper whose block starts at `offset` in the state vector
    pub fn new(
        model: &ModelDef,
        compartment: &Compartment,
        pixel_width: f64,
        offset: usize,
        constants: &[(String, f64)],
        backend: MathBackend,
    ) -> Result<Self, ModelError> {
        let species = model.field_species(compartment.id());
        let fields: Vec<String> = species.iter().map(|s| s.id.clone()).collect();
        let non_spatial = species
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_spatial)
            .map(|(f, _)| f)
            .collect();
        let diffusion_constants: Vec<Option<f64>> = species
            .iter()
            .map(|s| s.is_spatial.then_some(s.diffusion_constant))
            .collect();

        let diffusion = DiffusionOperator::new(compartment, &diffusion_constants, pixel_width);
        let reactions = ReactionSet::new(
            compartment.id(),
            fields.clone(),
            &model.reactions_in(compartment.id()),
            constants,
            backend,
        )?;

        let n_pixels = compartment.n_pixels();
        log::debug!(
            "compartment '{}': {} pixels, fields {:?}",
            compartment.id(),
            n_pixels,
            fields
        );

        Ok(Self {
            id: compartment.id().to_string(),
            n_pixels,
            range: offset..offset + fields.len() * n_pixels,
            fields,
            non_spatial,
            diffusion,
            reactions,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn n_pixels(&self) -> usize {
        self.n_pixels
    }

    /// Non-constant species ids, in state order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Position of this compartment's block in the state vector
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn reactions(&self) -> &ReactionSet {
        &self.reactions
    }

    /// Reset `dcdt` to the diffusion term
    pub fn diffusion_init(&self, conc: &[f64], dcdt: &mut [f64]) {
        self.diffusion.apply(conc, dcdt);
    }

    /// Add the reaction rates of every pixel to `dcdt`
    pub fn evaluate_reactions(&mut self, conc: &[f64], dcdt: &mut [f64]) {
        if self.reactions.is_empty() {
            return;
        }
        let n = self.n_pixels;
        let n_fields = self.fields.len();
        for i in 0..n {
            let values = self.reactions.values_mut();
            for f in 0..n_fields {
                values[f] = conc[f * n + i];
            }
            let rates = self.reactions.evaluate();
            for f in 0..n_fields {
                dcdt[f * n + i] += rates[f];
            }
        }
    }

    /// Replace the rate of every non-spatial field by its mean
    pub fn average_non_spatial(&self, dcdt: &mut [f64]) {
        let n = self.n_pixels;
        if n == 0 {
            return;
        }
        for &f in &self.non_spatial {
            let field = &mut dcdt[f * n..(f + 1) * n];
            let mean = field.iter().sum::<f64>() / n as f64;
            field.fill(mean);
        }
    }
}
