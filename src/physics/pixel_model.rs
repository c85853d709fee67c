//! Pixel reaction-diffusion model
//!
//! Assembles one [`CompartmentStepper`] per compartment and one
//! [`MembraneStepper`] per membrane into a [`RateModel`] over the flat state
//! vector.
//!
//! # Evaluation phases
//!
//! 1. **Phase A** (per compartment): reset the rates to the diffusion term,
//!    then add the compartment reactions.
//! 2. **Phase B** (per membrane): evaluate membrane reactions into each
//!    stepper's private flux buffer.
//! 3. **Phase C** (per compartment): add the fluxes of all adjoining
//!    membranes in ascending membrane order, then average non-spatial fields.
//!
//! Within a phase no two tasks write the same memory and every sum runs in a
//! fixed order, so the phases can run on the current rayon pool and still give
//! bit-identical results for any thread count.

use std::ops::Range;

use nalgebra::DVector;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::ModelError;
use crate::geometry::Geometry;
use crate::models::{InitialConcentration, ModelDef};

use super::compartment::CompartmentStepper;
use super::expression::MathBackend;
use super::membrane::{MembraneStepper, Side};
use super::traits::RateModel;

/// Reaction-diffusion model on a segmented voxel geometry
#[derive(Debug)]
pub struct PixelModel {
    name: String,
    compartments: Vec<CompartmentStepper>,
    membranes: Vec<MembraneStepper>,
    /// Per compartment: adjoining membranes and the side it sits on
    adjoining: Vec<Vec<(usize, Side)>>,
    initial: DVector<f64>,
    parallel: bool,
}

impl PixelModel {
    /// Build every stepper for `model` on `geometry`
    ///
    /// The model is validated first; an expression that fails to compile is
    /// reported with its region and species.
    pub fn new(model: &ModelDef, geometry: &Geometry, backend: MathBackend) -> Result<Self, ModelError> {
        model.validate(geometry)?;
        let constants = model.constants()?;

        // ====== Step 1: compartments, in geometry order ======
        let mut compartments = Vec::with_capacity(geometry.compartments().len());
        let mut offset = 0;
        for compartment in geometry.compartments() {
            let stepper = CompartmentStepper::new(
                model,
                compartment,
                geometry.pixel_width(),
                offset,
                &constants,
                backend,
            )?;
            offset = stepper.range().end;
            compartments.push(stepper);
        }

        // ====== Step 2: membranes ======
        let mut membranes = Vec::with_capacity(geometry.membranes().len());
        let mut adjoining = vec![Vec::new(); compartments.len()];
        for (m, membrane) in geometry.membranes().iter().enumerate() {
            let a = membrane.compartment_a();
            let b = membrane.compartment_b();
            membranes.push(MembraneStepper::new(
                model,
                membrane,
                &compartments[a],
                &compartments[b],
                &constants,
                backend,
            )?);
            adjoining[a].push((m, Side::A));
            adjoining[b].push((m, Side::B));
        }

        // ====== Step 3: initial state ======
        let mut initial = DVector::zeros(offset);
        for stepper in &compartments {
            let n = stepper.n_pixels();
            let block = stepper.range();
            for (f, id) in stepper.fields().iter().enumerate() {
                let Some(species) = model.species(id) else {
                    continue;
                };
                let field = &mut initial.as_mut_slice()[block.start + f * n..block.start + (f + 1) * n];
                match &species.initial {
                    InitialConcentration::Uniform(c) => field.fill(*c),
                    InitialConcentration::Field(values) => field.copy_from_slice(values),
                }
                if !species.is_spatial && n > 0 {
                    let mean = field.iter().sum::<f64>() / n as f64;
                    field.fill(mean);
                }
            }
        }

        log::debug!(
            "pixel model '{}': {} compartments, {} membranes, {} state values",
            model.name,
            compartments.len(),
            membranes.len(),
            offset
        );

        Ok(Self {
            name: model.name.clone(),
            compartments,
            membranes,
            adjoining,
            initial,
            parallel: cfg!(feature = "parallel"),
        })
    }

    pub fn compartments(&self) -> &[CompartmentStepper] {
        &self.compartments
    }

    pub fn membranes(&self) -> &[MembraneStepper] {
        &self.membranes
    }

    /// State range of one species field
    pub fn field_range(&self, compartment: usize, species: usize) -> Option<Range<usize>> {
        let stepper = self.compartments.get(compartment)?;
        if species >= stepper.fields().len() {
            return None;
        }
        let start = stepper.range().start + species * stepper.n_pixels();
        Some(start..start + stepper.n_pixels())
    }

    /// Run the phases on the current rayon pool (no effect without `parallel`)
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel && cfg!(feature = "parallel");
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    fn split_blocks<'a>(&self, mut buffer: &'a mut [f64]) -> Vec<&'a mut [f64]> {
        let mut blocks = Vec::with_capacity(self.compartments.len());
        for stepper in &self.compartments {
            let (head, tail) = std::mem::take(&mut buffer).split_at_mut(stepper.range().len());
            blocks.push(head);
            buffer = tail;
        }
        blocks
    }

    fn compute_sequential(&mut self, state: &[f64], rates: &mut [f64]) {
        let mut blocks = self.split_blocks(rates);

        for (stepper, dcdt) in self.compartments.iter_mut().zip(blocks.iter_mut()) {
            let conc = &state[stepper.range()];
            stepper.diffusion_init(conc, dcdt);
            stepper.evaluate_reactions(conc, dcdt);
        }

        for membrane in self.membranes.iter_mut() {
            let (a, b) = membrane.ranges();
            membrane.evaluate_reactions(&state[a], &state[b]);
        }

        for ((stepper, adjoining), dcdt) in self.compartments.iter().zip(&self.adjoining).zip(blocks.iter_mut()) {
            for &(m, side) in adjoining {
                self.membranes[m].scatter(side, dcdt);
            }
            stepper.average_non_spatial(dcdt);
        }
    }

    #[cfg(feature = "parallel")]
    fn compute_parallel(&mut self, state: &[f64], rates: &mut [f64]) {
        let mut blocks = self.split_blocks(rates);

        // ====== Phase A ======
        self.compartments
            .par_iter_mut()
            .zip(blocks.par_iter_mut())
            .for_each(|(stepper, dcdt)| {
                let conc = &state[stepper.range()];
                stepper.diffusion_init(conc, dcdt);
                stepper.evaluate_reactions(conc, dcdt);
            });

        // ====== Phase B ======
        self.membranes.par_iter_mut().for_each(|membrane| {
            let (a, b) = membrane.ranges();
            membrane.evaluate_reactions(&state[a], &state[b]);
        });

        // ====== Phase C ======
        let membranes = &self.membranes;
        self.compartments
            .par_iter()
            .zip(self.adjoining.par_iter())
            .zip(blocks.par_iter_mut())
            .for_each(|((stepper, adjoining), dcdt)| {
                for &(m, side) in adjoining {
                    membranes[m].scatter(side, dcdt);
                }
                stepper.average_non_spatial(dcdt);
            });
    }
}

impl RateModel for PixelModel {
    fn dimension(&self) -> usize {
        self.initial.len()
    }

    fn compute_rates(&mut self, state: &[f64], rates: &mut [f64]) {
        #[cfg(feature = "parallel")]
        if self.parallel {
            self.compute_parallel(state, rates);
            return;
        }
        self.compute_sequential(state, rates);
    }

    fn initial_state(&self) -> DVector<f64> {
        self.initial.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn locate(&self, index: usize) -> String {
        for stepper in &self.compartments {
            let range = stepper.range();
            if range.contains(&index) && stepper.n_pixels() > 0 {
                let local = index - range.start;
                let field = local / stepper.n_pixels();
                let pixel = local % stepper.n_pixels();
                return format!(
                    "species '{}' of compartment '{}' at pixel {}",
                    stepper.fields()[field],
                    stepper.id(),
                    pixel
                );
            }
        }
        format!("state[{}]", index)
    }
}
