//! Scalar expression evaluation
//!
//! An [`ExprEval`] compiles a textual rate law such as `k1 * A * B / (Km + A)`
//! against an ordered list of variable names and a set of named constants.
//! Variables are read, at call time, from a caller-owned `&[f64]` slice in the
//! same order as the names; constants are folded into the symbol table once.
//!
//! Parsing uses `meval`; the resulting postfix tokens are then resolved to
//! an index-based program evaluated on a reusable stack. A compiled
//! alternative lives in [`jit`](super::jit) behind the `jit` feature; both are
//! selected through [`MathBackend`].
//!
//! # Supported syntax
//!
//! `+ - * / ^`, parentheses, unary minus, the constants `pi` and `e` and the
//! functions `exp ln log log10 sqrt abs sin cos tan asin acos atan sinh cosh
//! tanh floor ceil min max pow`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use meval::tokenizer::{Operation, Token};
use meval::{ContextProvider, Expr, FuncEvalError};
use thiserror::Error;

// =================================================================================================
// Backend selection
// =================================================================================================

/// Interchangeable math-evaluation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MathBackend {
    /// Postfix interpreter, always available
    #[default]
    Interpreted,
    /// JIT-compiled machine code (`jit` feature)
    Compiled,
    /// JIT-compiled rates plus a symbolically differentiated Jacobian (`jit` feature)
    Symbolic,
}

impl MathBackend {
    pub fn name(&self) -> &'static str {
        match self {
            MathBackend::Interpreted => "Interpreted",
            MathBackend::Compiled => "Compiled",
            MathBackend::Symbolic => "Symbolic",
        }
    }

    /// Whether this build can provide the backend
    pub fn is_available(&self) -> bool {
        match self {
            MathBackend::Interpreted => true,
            MathBackend::Compiled | MathBackend::Symbolic => cfg!(feature = "jit"),
        }
    }
}

impl fmt::Display for MathBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =================================================================================================
// Errors
// =================================================================================================

/// Expression compilation failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("cannot parse '{expression}': {message}")]
    Syntax { expression: String, message: String },

    #[error("unknown symbol '{name}' in '{expression}'")]
    UnknownSymbol { expression: String, name: String },

    #[error("unknown function '{name}' in '{expression}'")]
    UnknownFunction { expression: String, name: String },

    #[error("math backend '{0}' is not available in this build")]
    BackendUnavailable(&'static str),

    #[error("compilation failed: {0}")]
    Compile(String),
}

// =================================================================================================
// Symbol table
// =================================================================================================

#[derive(Debug, Clone, Copy)]
enum Binding {
    Variable(usize),
    Constant(f64),
}

/// Names an expression may reference
///
/// Variables shadow constants of the same name.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    bindings: HashMap<String, Binding>,
    n_variables: usize,
}

impl SymbolTable {
    pub fn new(variables: &[String], constants: &[(String, f64)]) -> Self {
        let mut bindings = HashMap::with_capacity(variables.len() + constants.len());
        for (name, value) in constants {
            bindings.insert(name.clone(), Binding::Constant(*value));
        }
        for (i, name) in variables.iter().enumerate() {
            bindings.insert(name.clone(), Binding::Variable(i));
        }
        Self {
            bindings,
            n_variables: variables.len(),
        }
    }

    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// Borrowed view meval resolves a freshly parsed expression against
#[derive(Clone, Copy)]
struct Scope<'a> {
    symbols: &'a SymbolTable,
    values: &'a [f64],
}

impl ContextProvider for Scope<'_> {
    fn get_var(&self, name: &str) -> Option<f64> {
        match self.symbols.bindings.get(name) {
            Some(Binding::Variable(i)) => self.values.get(*i).copied(),
            Some(Binding::Constant(c)) => Some(*c),
            None => match name {
                "pi" => Some(std::f64::consts::PI),
                "e" => Some(std::f64::consts::E),
                _ => None,
            },
        }
    }

    fn eval_func(&self, name: &str, args: &[f64]) -> Result<f64, FuncEvalError> {
        let function = Function::resolve(name).ok_or(FuncEvalError::UnknownFunction)?;
        match (function, args.len()) {
            (_, 0) => Err(FuncEvalError::TooFewArguments),
            (Function::Unary(_), n) if n > 1 => Err(FuncEvalError::TooManyArguments),
            (Function::Pow, n) if n != 2 => Err(FuncEvalError::NumberArgs(2)),
            _ => Ok(function.apply(args)),
        }
    }
}

// =================================================================================================
// Lowered program
// =================================================================================================

#[derive(Debug, Clone, Copy)]
enum Function {
    Unary(fn(f64) -> f64),
    Pow,
    Min,
    Max,
}

impl Function {
    fn resolve(name: &str) -> Option<Self> {
        let unary: fn(f64) -> f64 = match name {
            "pow" => return Some(Function::Pow),
            "min" => return Some(Function::Min),
            "max" => return Some(Function::Max),
            "exp" => f64::exp,
            "ln" | "log" => f64::ln,
            "log10" => f64::log10,
            "sqrt" => f64::sqrt,
            "abs" => f64::abs,
            "sin" => f64::sin,
            "cos" => f64::cos,
            "tan" => f64::tan,
            "asin" => f64::asin,
            "acos" => f64::acos,
            "atan" => f64::atan,
            "sinh" => f64::sinh,
            "cosh" => f64::cosh,
            "tanh" => f64::tanh,
            "floor" => f64::floor,
            "ceil" => f64::ceil,
            _ => return None,
        };
        Some(Function::Unary(unary))
    }

    fn apply(self, args: &[f64]) -> f64 {
        match (self, args) {
            (Function::Unary(f), [x]) => f(*x),
            (Function::Pow, [base, exponent]) => base.powf(*exponent),
            (Function::Min, [first, rest @ ..]) => rest.iter().copied().fold(*first, f64::min),
            (Function::Max, [first, rest @ ..]) => rest.iter().copied().fold(*first, f64::max),
            _ => f64::NAN,
        }
    }
}

/// One postfix instruction with its symbols already resolved
#[derive(Debug, Clone, Copy)]
enum Op {
    Variable(usize),
    Constant(f64),
    Binary(Operation),
    Negate,
    Call(Function, usize),
}

/// Resolve the parsed postfix tokens against `symbols`
///
/// Returns the program and the deepest stack it needs.
fn lower(expression: &str, expr: &Expr, symbols: &SymbolTable) -> Result<(Vec<Op>, usize), ExpressionError> {
    let syntax = |message: String| ExpressionError::Syntax {
        expression: expression.to_string(),
        message,
    };

    let tokens: &[Token] = expr;
    let mut program = Vec::with_capacity(tokens.len());
    let mut depth: usize = 0;
    let mut max_depth: usize = 0;

    for token in tokens {
        let (op, pops) = match token {
            Token::Number(x) => (Op::Constant(*x), 0),
            Token::Var(name) => {
                let op = match symbols.bindings.get(name.as_str()) {
                    Some(Binding::Variable(i)) => Op::Variable(*i),
                    Some(Binding::Constant(c)) => Op::Constant(*c),
                    None => match name.as_str() {
                        "pi" => Op::Constant(std::f64::consts::PI),
                        "e" => Op::Constant(std::f64::consts::E),
                        _ => {
                            return Err(ExpressionError::UnknownSymbol {
                                expression: expression.to_string(),
                                name: name.clone(),
                            });
                        }
                    },
                };
                (op, 0)
            }
            Token::Binary(op) => (Op::Binary(*op), 2),
            Token::Unary(Operation::Plus) => continue,
            Token::Unary(Operation::Minus) => (Op::Negate, 1),
            Token::Func(name, Some(n)) => {
                let function = Function::resolve(name).ok_or_else(|| ExpressionError::UnknownFunction {
                    expression: expression.to_string(),
                    name: name.clone(),
                })?;
                (Op::Call(function, *n), *n)
            }
            other => return Err(syntax(format!("unexpected token {:?}", other))),
        };

        depth = depth
            .checked_sub(pops)
            .ok_or_else(|| syntax("operator is missing an operand".to_string()))?
            + 1;
        max_depth = max_depth.max(depth);
        program.push(op);
    }

    if depth != 1 {
        return Err(syntax("expression does not reduce to one value".to_string()));
    }
    Ok((program, max_depth))
}

// =================================================================================================
// ExprEval
// =================================================================================================

/// Compiled scalar expression over bound variables and constants
///
/// The parsed expression is lowered once to a postfix program in which
/// variables are slice indices and constants are folded in, so that
/// [`eval_with`](Self::eval_with) runs without allocating.
#[derive(Debug, Clone)]
pub struct ExprEval {
    source: String,
    program: Vec<Op>,
    stack_depth: usize,
}

impl ExprEval {
    /// Compile `expression` with its own symbol table
    ///
    /// # Example
    ///
    /// ```rust
    /// use pixsim_rs::physics::ExprEval;
    ///
    /// let vars = vec!["A".to_string(), "B".to_string()];
    /// let consts = vec![("k".to_string(), 2.0)];
    /// let rate = ExprEval::compile("k * A * B", &vars, &consts)?;
    /// assert_eq!(rate.eval(&[3.0, 0.5]), 3.0);
    /// # Ok::<(), pixsim_rs::physics::ExpressionError>(())
    /// ```
    pub fn compile(
        expression: &str,
        variables: &[String],
        constants: &[(String, f64)],
    ) -> Result<Self, ExpressionError> {
        Self::with_symbols(expression, Arc::new(SymbolTable::new(variables, constants)))
    }

    /// Compile `expression` against a shared symbol table
    ///
    /// Every referenced name and function is resolved once here with all
    /// variables set to zero, so that evaluation cannot hit an unbound
    /// symbol later.
    pub fn with_symbols(expression: &str, symbols: Arc<SymbolTable>) -> Result<Self, ExpressionError> {
        let expr = Expr::from_str(expression).map_err(|e| ExpressionError::Syntax {
            expression: expression.to_string(),
            message: e.to_string(),
        })?;

        let zeros = vec![0.0; symbols.n_variables()];
        let scope = Scope {
            symbols: &symbols,
            values: &zeros,
        };
        if let Err(e) = expr.eval_with_context(scope) {
            return Err(match e {
                meval::Error::UnknownVariable(name) => ExpressionError::UnknownSymbol {
                    expression: expression.to_string(),
                    name,
                },
                meval::Error::Function(name, FuncEvalError::UnknownFunction) => {
                    ExpressionError::UnknownFunction {
                        expression: expression.to_string(),
                        name,
                    }
                }
                other => ExpressionError::Syntax {
                    expression: expression.to_string(),
                    message: other.to_string(),
                },
            });
        }

        let (program, stack_depth) = lower(expression, &expr, &symbols)?;
        Ok(Self {
            source: expression.to_string(),
            program,
            stack_depth,
        })
    }

    /// Evaluate with `values[i]` bound to the i-th variable
    ///
    /// Allocates a stack per call; hot loops use [`eval_with`](Self::eval_with).
    pub fn eval(&self, values: &[f64]) -> f64 {
        let mut stack = Vec::with_capacity(self.stack_depth);
        self.eval_with(values, &mut stack)
    }

    /// Evaluate on a caller-owned stack
    ///
    /// Does not allocate once `stack` has [`stack_depth`](Self::stack_depth)
    /// capacity. Returns NaN for a missing variable; the integrator's state
    /// validation reports it.
    pub fn eval_with(&self, values: &[f64], stack: &mut Vec<f64>) -> f64 {
        stack.clear();
        for op in &self.program {
            let value = match *op {
                Op::Variable(i) => values.get(i).copied().unwrap_or(f64::NAN),
                Op::Constant(c) => c,
                Op::Binary(operation) => {
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        return f64::NAN;
                    };
                    match operation {
                        Operation::Plus => left + right,
                        Operation::Minus => left - right,
                        Operation::Times => left * right,
                        Operation::Div => left / right,
                        Operation::Rem => left % right,
                        Operation::Pow => left.powf(right),
                    }
                }
                Op::Negate => match stack.pop() {
                    Some(x) => -x,
                    None => return f64::NAN,
                },
                Op::Call(function, n) => {
                    let Some(start) = stack.len().checked_sub(n) else {
                        return f64::NAN;
                    };
                    let result = function.apply(&stack[start..]);
                    stack.truncate(start);
                    result
                }
            };
            stack.push(value);
        }
        stack.pop().unwrap_or(f64::NAN)
    }

    /// Deepest operand stack [`eval_with`](Self::eval_with) needs
    pub fn stack_depth(&self) -> usize {
        self.stack_depth
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_variables_and_constants() {
        let eval = ExprEval::compile(
            "k * (A - B)",
            &names(&["A", "B"]),
            &[("k".to_string(), 0.1)],
        )
        .unwrap();
        assert_relative_eq!(eval.eval(&[1.0, 0.25]), 0.075, epsilon = 1e-15);
        assert_relative_eq!(eval.eval(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_variables_shadow_constants() {
        let eval = ExprEval::compile("x", &names(&["x"]), &[("x".to_string(), 5.0)]).unwrap();
        assert_eq!(eval.eval(&[2.0]), 2.0);
    }

    #[test]
    fn test_functions_and_builtin_constants() {
        let eval = ExprEval::compile(
            "exp(ln(x)) + pow(2, 3) + max(1, 4, 2) + min(3, y) + sin(pi / 2)",
            &names(&["x", "y"]),
            &[],
        )
        .unwrap();
        assert_relative_eq!(eval.eval(&[2.5, -1.0]), 2.5 + 8.0 + 4.0 - 1.0 + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_power_operator() {
        let eval = ExprEval::compile("x^2 / (1 + x^2)", &names(&["x"]), &[]).unwrap();
        assert_relative_eq!(eval.eval(&[2.0]), 0.8, epsilon = 1e-15);
    }

    #[test]
    fn test_unknown_symbol_reported() {
        let err = ExprEval::compile("k * A", &names(&["A"]), &[]).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::UnknownSymbol {
                expression: "k * A".to_string(),
                name: "k".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_function_reported() {
        let err = ExprEval::compile("gamma(A)", &names(&["A"]), &[]).unwrap_err();
        assert!(matches!(err, ExpressionError::UnknownFunction { ref name, .. } if name == "gamma"));
    }

    #[test]
    fn test_syntax_error_reported() {
        let err = ExprEval::compile("A * (B + ", &names(&["A", "B"]), &[]).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { .. }));
    }

    #[test]
    fn test_division_by_zero_is_not_a_compile_error() {
        let eval = ExprEval::compile("1 / A", &names(&["A"]), &[]).unwrap();
        assert!(eval.eval(&[0.0]).is_infinite());
        assert_eq!(eval.eval(&[4.0]), 0.25);
    }

    #[test]
    fn test_shared_symbols() {
        let symbols = Arc::new(SymbolTable::new(&names(&["a", "b"]), &[]));
        let first = ExprEval::with_symbols("a + b", symbols.clone()).unwrap();
        let second = ExprEval::with_symbols("a * b", symbols).unwrap();
        assert_eq!(first.eval(&[2.0, 3.0]), 5.0);
        assert_eq!(second.eval(&[2.0, 3.0]), 6.0);
        assert_eq!(first.source(), "a + b");
    }

    #[test]
    fn test_eval_with_reuses_stack() {
        let eval = ExprEval::compile("-(a + b) * max(a, b, 1) / pow(b, 2)", &names(&["a", "b"]), &[]).unwrap();
        let mut stack = Vec::with_capacity(eval.stack_depth());
        let capacity = stack.capacity();

        for (a, b) in [(1.0, 2.0), (3.0, 0.5), (-4.0, 4.0)] {
            let expected = -(a + b) * f64::max(f64::max(a, b), 1.0) / (b * b);
            assert_relative_eq!(eval.eval_with(&[a, b], &mut stack), expected, epsilon = 1e-12);
        }
        assert_eq!(stack.capacity(), capacity);
        assert_eq!(eval.stack_depth(), 4);
    }

    #[test]
    fn test_unary_plus_and_remainder() {
        let eval = ExprEval::compile("+x % 3", &names(&["x"]), &[]).unwrap();
        assert_eq!(eval.eval(&[7.0]), 1.0);
    }

    #[test]
    fn test_wrong_argument_count_rejected() {
        let err = ExprEval::compile("pow(A)", &names(&["A"]), &[]).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { .. }));
        let err = ExprEval::compile("exp(A, A)", &names(&["A"]), &[]).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { .. }));
    }

    #[test]
    fn test_backend_availability() {
        assert!(MathBackend::Interpreted.is_available());
        assert_eq!(MathBackend::Compiled.is_available(), cfg!(feature = "jit"));
        assert_eq!(MathBackend::default(), MathBackend::Interpreted);
    }
}
