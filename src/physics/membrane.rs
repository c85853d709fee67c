//! Reaction stepper for the pixel pairs of one membrane

use std::ops::Range;

use crate::error::ModelError;
use crate::geometry::Membrane;
use crate::models::ModelDef;

use super::compartment::CompartmentStepper;
use super::expression::MathBackend;
use super::reaction_set::ReactionSet;

/// Which compartment of a membrane a flux is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// Reactions across one membrane
///
/// Results are kept in a private flux buffer laid out per pair as
/// `[A-side rates | B-side rates]` until they are scattered into the two
/// compartments.
#[derive(Debug)]
pub struct MembraneStepper {
    id: String,
    compartment_a: usize,
    compartment_b: usize,
    range_a: Range<usize>,
    range_b: Range<usize>,
    n_pixels_a: usize,
    n_pixels_b: usize,
    n_fields_a: usize,
    n_fields_b: usize,
    pairs: Vec<(usize, usize)>,
    reactions: ReactionSet,
    flux: Vec<f64>,
}

impl MembraneStepper {
    /// Build the stepper between two already built compartment steppers
    pub fn new(
        model: &ModelDef,
        membrane: &Membrane,
        a: &CompartmentStepper,
        b: &CompartmentStepper,
        constants: &[(String, f64)],
        backend: MathBackend,
    ) -> Result<Self, ModelError> {
        let species: Vec<String> = a.fields().iter().chain(b.fields()).cloned().collect();
        let reactions = ReactionSet::new(
            membrane.id(),
            species,
            &model.reactions_in(membrane.id()),
            constants,
            backend,
        )?;

        let n_fields_a = a.fields().len();
        let n_fields_b = b.fields().len();
        let pairs = membrane.pairs().to_vec();
        if pairs.is_empty() {
            log::debug!("membrane '{}' has no pixel pairs", membrane.id());
        }

        Ok(Self {
            id: membrane.id().to_string(),
            compartment_a: membrane.compartment_a(),
            compartment_b: membrane.compartment_b(),
            range_a: a.range(),
            range_b: b.range(),
            n_pixels_a: a.n_pixels(),
            n_pixels_b: b.n_pixels(),
            n_fields_a,
            n_fields_b,
            flux: vec![0.0; pairs.len() * (n_fields_a + n_fields_b)],
            pairs,
            reactions,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn compartment_a(&self) -> usize {
        self.compartment_a
    }

    pub fn compartment_b(&self) -> usize {
        self.compartment_b
    }

    /// State ranges of the A and B compartments
    pub fn ranges(&self) -> (Range<usize>, Range<usize>) {
        (self.range_a.clone(), self.range_b.clone())
    }

    pub fn reactions(&self) -> &ReactionSet {
        &self.reactions
    }

    /// Evaluate the reactions of every pixel pair into the flux buffer
    pub fn evaluate_reactions(&mut self, conc_a: &[f64], conc_b: &[f64]) {
        if self.reactions.is_empty() {
            return;
        }
        let (na, nb) = (self.n_pixels_a, self.n_pixels_b);
        let (fa, fb) = (self.n_fields_a, self.n_fields_b);
        let width = fa + fb;

        for (p, &(ix_a, ix_b)) in self.pairs.iter().enumerate() {
            let values = self.reactions.values_mut();
            for f in 0..fa {
                values[f] = conc_a[f * na + ix_a];
            }
            for f in 0..fb {
                values[fa + f] = conc_b[f * nb + ix_b];
            }
            let rates = self.reactions.evaluate();
            self.flux[p * width..(p + 1) * width].copy_from_slice(rates);
        }
    }

    /// Add the buffered fluxes into the rates of one side
    pub fn scatter(&self, side: Side, dcdt: &mut [f64]) {
        match side {
            Side::A => self.scatter_a(dcdt),
            Side::B => self.scatter_b(dcdt),
        }
    }

    pub fn scatter_a(&self, dcdt_a: &mut [f64]) {
        if self.reactions.is_empty() {
            return;
        }
        let width = self.n_fields_a + self.n_fields_b;
        let n = self.n_pixels_a;
        for (p, &(ix_a, _)) in self.pairs.iter().enumerate() {
            let flux = &self.flux[p * width..p * width + self.n_fields_a];
            for (f, v) in flux.iter().enumerate() {
                dcdt_a[f * n + ix_a] += v;
            }
        }
    }

    pub fn scatter_b(&self, dcdt_b: &mut [f64]) {
        if self.reactions.is_empty() {
            return;
        }
        let width = self.n_fields_a + self.n_fields_b;
        let n = self.n_pixels_b;
        for (p, &(_, ix_b)) in self.pairs.iter().enumerate() {
            let flux = &self.flux[p * width + self.n_fields_a..(p + 1) * width];
            for (f, v) in flux.iter().enumerate() {
                dcdt_b[f * n + ix_b] += v;
            }
        }
    }
}
