//! Per-region reaction evaluator
//!
//! A [`ReactionSet`] holds one net rate expression for each non-constant
//! species of a region (a compartment, or the two sides of a membrane). The
//! caller writes the local concentrations into [`values_mut`] and reads the
//! rates of change back from [`evaluate`]. Those buffers and the operand
//! stack are allocated once, so evaluating a pixel never allocates.
//!
//! [`values_mut`]: ReactionSet::values_mut
//! [`evaluate`]: ReactionSet::evaluate

use std::sync::Arc;

use nalgebra::DMatrix;

use crate::error::ModelError;
use crate::models::rhs::rate_expressions;
use crate::models::ReactionDef;

use super::expression::{ExprEval, MathBackend, SymbolTable};
#[cfg(feature = "jit")]
use super::jit::CompiledRates;

enum Evaluator {
    Interpreted(Vec<ExprEval>),
    #[cfg(feature = "jit")]
    Compiled(CompiledRates),
}

/// Rate expressions of one region, bound to a scratch vector
pub struct ReactionSet {
    region: String,
    species: Vec<String>,
    expressions: Vec<String>,
    n_reactions: usize,
    evaluator: Evaluator,
    values: Vec<f64>,
    results: Vec<f64>,
    stack: Vec<f64>,
}

impl std::fmt::Debug for ReactionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionSet")
            .field("region", &self.region)
            .field("species", &self.species)
            .field("expressions", &self.expressions)
            .finish()
    }
}

impl ReactionSet {
    /// Build the set for `region`
    ///
    /// `species` fixes the order of both the scratch vector and the results.
    /// Expressions are always checked with the interpreter first so that
    /// unknown symbols are reported by name whatever the backend.
    pub fn new(
        region: &str,
        species: Vec<String>,
        reactions: &[&ReactionDef],
        constants: &[(String, f64)],
        backend: MathBackend,
    ) -> Result<Self, ModelError> {
        let expressions = rate_expressions(&species, reactions);
        let symbols = Arc::new(SymbolTable::new(&species, constants));

        let mut interpreted = Vec::with_capacity(expressions.len());
        for (s, expression) in species.iter().zip(&expressions) {
            let eval = ExprEval::with_symbols(expression, Arc::clone(&symbols)).map_err(|source| {
                ModelError::Expression {
                    region: region.to_string(),
                    species: s.clone(),
                    source,
                }
            })?;
            interpreted.push(eval);
        }

        let stack_depth = interpreted.iter().map(ExprEval::stack_depth).max().unwrap_or(0);
        let evaluator = match backend {
            MathBackend::Interpreted => Evaluator::Interpreted(interpreted),
            MathBackend::Compiled | MathBackend::Symbolic => {
                Self::compiled(region, &species, &expressions, constants, backend)?
            }
        };

        for (s, e) in species.iter().zip(&expressions) {
            log::debug!("{}: d{}/dt = {}", region, s, e);
        }

        let n = species.len();
        Ok(Self {
            region: region.to_string(),
            species,
            expressions,
            n_reactions: reactions.len(),
            evaluator,
            values: vec![0.0; n],
            results: vec![0.0; n],
            stack: Vec::with_capacity(stack_depth),
        })
    }

    #[cfg(feature = "jit")]
    fn compiled(
        region: &str,
        species: &[String],
        expressions: &[String],
        constants: &[(String, f64)],
        backend: MathBackend,
    ) -> Result<Evaluator, ModelError> {
        let with_jacobian = backend == MathBackend::Symbolic;
        CompiledRates::compile(expressions, species, constants, with_jacobian)
            .map(Evaluator::Compiled)
            .map_err(|source| ModelError::Expression {
                region: region.to_string(),
                species: species.join(", "),
                source,
            })
    }

    #[cfg(not(feature = "jit"))]
    fn compiled(
        region: &str,
        species: &[String],
        _expressions: &[String],
        _constants: &[(String, f64)],
        backend: MathBackend,
    ) -> Result<Evaluator, ModelError> {
        Err(ModelError::Expression {
            region: region.to_string(),
            species: species.join(", "),
            source: super::expression::ExpressionError::BackendUnavailable(backend.name()),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    /// Net rate expression of each species, after parameter inlining
    pub fn expressions(&self) -> &[String] {
        &self.expressions
    }

    /// No reaction touches this region
    pub fn is_empty(&self) -> bool {
        self.n_reactions == 0
    }

    /// Scratch vector the expressions read from, in species order
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Evaluate every rate at the current scratch values
    pub fn evaluate(&mut self) -> &[f64] {
        match &mut self.evaluator {
            Evaluator::Interpreted(evals) => {
                for (r, e) in self.results.iter_mut().zip(evals.iter()) {
                    *r = e.eval_with(&self.values, &mut self.stack);
                }
            }
            #[cfg(feature = "jit")]
            Evaluator::Compiled(compiled) => {
                if compiled.evaluate(&self.values, &mut self.results).is_err() {
                    self.results.fill(f64::NAN);
                }
            }
        }
        &self.results
    }

    /// Jacobian of the rates with respect to the species, at the last values
    ///
    /// Only the `Symbolic` backend provides one.
    pub fn jacobian(&self) -> Option<DMatrix<f64>> {
        match &self.evaluator {
            Evaluator::Interpreted(_) => None,
            #[cfg(feature = "jit")]
            Evaluator::Compiled(compiled) => compiled.jacobian(),
        }
    }
}
