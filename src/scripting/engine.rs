//! Rhai Script Engine Implementation
//!
//! The engine is built from `Engine::new_raw()` with only the core, logic and
//! basic math packages registered. There is no file module resolver, no time
//! source and no `eval`, so a script can only touch its own scope.
//!
//! ## Safety Limits
//!
//! Every run is bounded by [`EvaluatorLimits`]: an operation budget, call and
//! expression depth limits, and container size limits. Tripping any of them
//! aborts the run with [`FailureKind::ResourceExhausted`].
//!
//! ## Helper Functions
//!
//! - `clamp(x, min, max)` - Clamp to a range
//! - `lerp(a, b, t)` - Linear interpolation
//! - `map_range(x, in_min, in_max, out_min, out_max)` - Remap between ranges
//! - `sign(x)` - -1, 0 or 1
//! - `pi()`, `e()` - Constants

use crate::config::EvaluatorLimits;
use crate::scripting::{
    Bindings, CompiledScript, Evaluation, EvaluationFailure, FailureKind, OUTPUT_BINDING,
};
use rhai::module_resolvers::DummyModuleResolver;
use rhai::packages::{BasicMathPackage, CorePackage, LogicPackage, Package};
use rhai::{Dynamic, Engine, EvalAltResult, ParseError, ParseErrorType};

/// Sandboxed engine for node scripts.
///
/// Holds only immutable configuration, so one engine can be shared by every
/// instance of a node type and used from several threads.
pub struct ScriptEngine {
    /// The Rhai engine instance
    engine: Engine,
    /// Limits the engine was configured with
    limits: EvaluatorLimits,
}

impl ScriptEngine {
    /// Create a new script engine with default limits
    pub fn new() -> Self {
        Self::with_limits(EvaluatorLimits::default())
    }

    /// Create a new script engine with explicit limits
    pub fn with_limits(limits: EvaluatorLimits) -> Self {
        let mut engine = Engine::new_raw();
        Self::configure_engine(&mut engine, &limits);
        Self { engine, limits }
    }

    /// Configure the Rhai engine with the sandbox surface and safety limits
    fn configure_engine(engine: &mut Engine, limits: &EvaluatorLimits) {
        CorePackage::new().register_into_engine(engine);
        LogicPackage::new().register_into_engine(engine);
        BasicMathPackage::new().register_into_engine(engine);

        engine.set_module_resolver(DummyModuleResolver::new());
        engine.disable_symbol("eval");

        // Script output never reaches stdout/stderr
        engine.on_print(|text| tracing::debug!(target: "script_node::script", "{}", text));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(
                target: "script_node::script",
                source = source.unwrap_or("<script>"),
                "{:?}: {}",
                pos,
                text
            )
        });

        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);

        engine.register_fn("clamp", |x: f64, min: f64, max: f64| {
            if min <= max {
                x.clamp(min, max)
            } else {
                x.clamp(max, min)
            }
        });
        engine.register_fn("lerp", |a: f64, b: f64, t: f64| a + (b - a) * t);
        engine.register_fn(
            "map_range",
            |x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64| {
                (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
            },
        );
        engine.register_fn("sign", |x: f64| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        });
        engine.register_fn("pi", || std::f64::consts::PI);
        engine.register_fn("e", || std::f64::consts::E);
    }

    /// Compile a script without running it
    pub fn compile(&self, source: &str) -> Result<CompiledScript, EvaluationFailure> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|e| classify_parse_error(&e))?;

        Ok(CompiledScript {
            ast,
            source: source.to_string(),
        })
    }

    /// Run a compiled script against fresh bindings and read back `output`
    pub fn run(
        &self,
        script: &CompiledScript,
        bindings: Bindings,
    ) -> Result<f64, EvaluationFailure> {
        let mut scope = bindings.to_scope();

        self.engine
            .run_ast_with_scope(&mut scope, script.ast())
            .map_err(|e| classify_eval_error(&e))?;

        let output = scope
            .get_value::<Dynamic>(OUTPUT_BINDING)
            .unwrap_or(Dynamic::UNIT);
        extract_number(&output)
    }

    /// Compile and run in one step
    pub fn try_evaluate(&self, source: &str, bindings: Bindings) -> Result<f64, EvaluationFailure> {
        let script = self.compile(source)?;
        self.run(&script, bindings)
    }

    /// Compile and run, folding failures into the fallback value
    pub fn evaluate(&self, source: &str, bindings: Bindings) -> Evaluation {
        Evaluation::from(self.try_evaluate(source, bindings))
    }

    /// Validate a script without executing it
    pub fn validate(&self, source: &str) -> Result<(), EvaluationFailure> {
        self.compile(source).map(|_| ())
    }

    /// Limits this engine enforces
    pub fn limits(&self) -> &EvaluatorLimits {
        &self.limits
    }

    /// Get a reference to the underlying Rhai engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("limits", &self.limits)
            .finish()
    }
}

fn classify_parse_error(err: &ParseError) -> EvaluationFailure {
    let kind = match err.err_type() {
        ParseErrorType::ExprTooDeep => FailureKind::ResourceExhausted,
        _ => FailureKind::Parse,
    };
    EvaluationFailure::new(kind, err.to_string())
}

fn classify_eval_error(err: &EvalAltResult) -> EvaluationFailure {
    EvaluationFailure::new(failure_kind(err), err.to_string())
}

fn failure_kind(err: &EvalAltResult) -> FailureKind {
    match err {
        // Errors raised inside script functions carry the real cause
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => failure_kind(inner),
        EvalAltResult::ErrorParsing(ParseErrorType::ExprTooDeep, _) => {
            FailureKind::ResourceExhausted
        }
        EvalAltResult::ErrorParsing(..) => FailureKind::Parse,
        EvalAltResult::ErrorVariableNotFound(..)
        | EvalAltResult::ErrorFunctionNotFound(..)
        | EvalAltResult::ErrorModuleNotFound(..)
        | EvalAltResult::ErrorPropertyNotFound(..) => FailureKind::NameNotFound,
        EvalAltResult::ErrorMismatchDataType(..)
        | EvalAltResult::ErrorMismatchOutputType(..)
        | EvalAltResult::ErrorIndexingType(..) => FailureKind::Type,
        EvalAltResult::ErrorTooManyOperations(..)
        | EvalAltResult::ErrorStackOverflow(..)
        | EvalAltResult::ErrorDataTooLarge(..)
        | EvalAltResult::ErrorTooManyModules(..) => FailureKind::ResourceExhausted,
        _ => FailureKind::Runtime,
    }
}

fn extract_number(value: &Dynamic) -> Result<f64, EvaluationFailure> {
    if let Ok(f) = value.as_float() {
        Ok(f)
    } else if let Ok(i) = value.as_int() {
        Ok(i as f64)
    } else {
        Err(EvaluationFailure::new(
            FailureKind::NonNumericOutput,
            format!(
                "'{}' must be numeric, found {}",
                OUTPUT_BINDING,
                value.type_name()
            ),
        ))
    }
}
