//! JIT-compiled rate systems (`jit` feature)
//!
//! All rate expressions of one region are compiled together into a single
//! `evalexpr_jit` equation system. The input vector is laid out as the
//! region's species followed by its constants; constants are written once at
//! construction and never touched again.

use std::collections::HashMap;

use evalexpr_jit::system::EquationSystem;
use nalgebra::DMatrix;

use super::expression::ExpressionError;

pub(crate) struct CompiledRates {
    system: EquationSystem,
    jacobian: Option<EquationSystem>,
    inputs: Vec<f64>,
    n_variables: usize,
}

impl CompiledRates {
    /// Compile one expression per species
    ///
    /// With `with_jacobian`, the derivative of every rate with respect to
    /// every species is derived symbolically and compiled as well.
    pub(crate) fn compile(
        expressions: &[String],
        variables: &[String],
        constants: &[(String, f64)],
        with_jacobian: bool,
    ) -> Result<Self, ExpressionError> {
        let mut var_map: HashMap<String, u32> = HashMap::new();
        let mut inputs = vec![0.0; variables.len()];
        for (i, name) in variables.iter().enumerate() {
            var_map.insert(name.clone(), i as u32);
        }
        for (name, value) in constants {
            if var_map.contains_key(name) {
                continue;
            }
            var_map.insert(name.clone(), inputs.len() as u32);
            inputs.push(*value);
        }

        let system = EquationSystem::from_var_map(expressions.to_vec(), &var_map)
            .map_err(|e| ExpressionError::Compile(format!("{:?}", e)))?;

        let jacobian = if with_jacobian {
            let wrt: Vec<&str> = variables.iter().map(|s| s.as_str()).collect();
            Some(
                system
                    .jacobian_wrt(&wrt)
                    .map_err(|e| ExpressionError::Compile(format!("{:?}", e)))?,
            )
        } else {
            None
        };

        Ok(Self {
            system,
            jacobian,
            inputs,
            n_variables: variables.len(),
        })
    }

    /// Evaluate all rates at `values`, writing one result per species
    pub(crate) fn evaluate(&mut self, values: &[f64], out: &mut Vec<f64>) -> Result<(), ExpressionError> {
        self.inputs[..self.n_variables].copy_from_slice(values);
        self.system
            .eval_into(&self.inputs, out)
            .map_err(|e| ExpressionError::Compile(format!("{:?}", e)))
    }

    /// Jacobian `d rate_i / d species_j` at the last evaluated values
    pub(crate) fn jacobian(&self) -> Option<DMatrix<f64>> {
        self.jacobian
            .as_ref()
            .and_then(|j| j.eval_matrix(&self.inputs).ok())
    }
}
