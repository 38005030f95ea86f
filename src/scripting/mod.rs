//! Sandboxed Rhai evaluation for the script node
//!
//! A script sees exactly five variables and nothing else:
//!
//! - `a`, `b`, `c`, `d` - the node's numeric inputs
//! - `output` - the result, pre-initialised to `0.0`
//!
//! After the script runs, whatever is left in `output` is the node's value.
//! A script that never assigns `output` yields `0.0`.
//!
//! ## Example Scripts
//!
//! Sum of two inputs:
//! ```rhai
//! output = a + b;
//! ```
//!
//! Clamped blend using locals and math functions:
//! ```rhai
//! let t = clamp(c, 0.0, 1.0);
//! output = a + (b - a) * t;
//! ```
//!
//! Branching:
//! ```rhai
//! if d > 0.0 { output = a / d; } else { output = a; }
//! ```
//!
//! ## Failures
//!
//! Any parse or runtime fault becomes an [`EvaluationFailure`]. Callers that
//! need a value regardless use [`Evaluation`], which pairs the fallback
//! `0.0` with the failure.

mod engine;

pub use engine::ScriptEngine;

use rhai::{Scope, AST};
use std::fmt;
use thiserror::Error;

/// Value used whenever evaluation fails.
pub const FALLBACK_VALUE: f64 = 0.0;

/// Name of the result binding.
pub const OUTPUT_BINDING: &str = "output";

/// Names of the numeric input bindings, in port order.
pub const INPUT_BINDINGS: [&str; 4] = ["a", "b", "c", "d"];

/// Current values for the four numeric bindings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bindings {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Bindings {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub fn values(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Build a fresh scope holding the inputs and `output = 0.0`.
    pub(crate) fn to_scope(self) -> Scope<'static> {
        let mut scope = Scope::new();
        for (name, value) in INPUT_BINDINGS.iter().zip(self.values()) {
            scope.push(*name, value);
        }
        scope.push(OUTPUT_BINDING, FALLBACK_VALUE);
        scope
    }
}

impl From<[f64; 4]> for Bindings {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Classification of an evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Script text did not parse.
    Parse,
    /// Script referenced a variable, function or module outside the sandbox.
    NameNotFound,
    /// Operator or function applied to the wrong types.
    Type,
    /// Any other runtime fault (arithmetic, explicit throw, ...).
    Runtime,
    /// Operation budget, call depth or size limit exceeded.
    ResourceExhausted,
    /// Script left a non-numeric value in `output`.
    NonNumericOutput,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Parse => "parse error",
            FailureKind::NameNotFound => "name not found",
            FailureKind::Type => "type error",
            FailureKind::Runtime => "runtime error",
            FailureKind::ResourceExhausted => "resource exhausted",
            FailureKind::NonNumericOutput => "non-numeric output",
        };
        f.write_str(s)
    }
}

/// A classified, human-readable evaluation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct EvaluationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl EvaluationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The `(value, failure?)` pair produced by one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    pub failure: Option<EvaluationFailure>,
}

impl Evaluation {
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

impl From<Result<f64, EvaluationFailure>> for Evaluation {
    fn from(result: Result<f64, EvaluationFailure>) -> Self {
        match result {
            Ok(value) => Self {
                value,
                failure: None,
            },
            Err(failure) => Self {
                value: FALLBACK_VALUE,
                failure: Some(failure),
            },
        }
    }
}

/// A script compiled against the sandboxed engine
#[derive(Clone)]
pub struct CompiledScript {
    ast: AST,
    source: String,
}

impl CompiledScript {
    /// Get the source code of this script
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn ast(&self) -> &AST {
        &self.ast
    }
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("source", &self.source)
            .finish()
    }
}
