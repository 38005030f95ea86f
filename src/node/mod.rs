//! Node instances and the script node's compute entry point.
//!
//! Two layers:
//! - **`Node` trait**: what a host drives, `compute(port, data, sink)`.
//! - **`ScriptNode`**: the scripted attribute node. It declares its ports
//!   once per type ([`ScriptNode::initialize`]) and evaluates its script on
//!   every compute of the output port.
//!
//! The schema is shared by every instance; the only per-instance state a
//! `ScriptNode` keeps is its last compiled script.

pub mod data;

pub use data::DataBlock;

use crate::config::ScriptNodeConfig;
use crate::diagnostics::{DiagnosticLevel, DiagnosticSink};
use crate::error::Result;
use crate::host::{NodeFactory, NodeHost};
use crate::schema::{AttributeSchema, PortDescriptor, PortId, PortKind, SchemaBuilder};
use crate::scripting::{
    Bindings, CompiledScript, Evaluation, EvaluationFailure, FailureKind, ScriptEngine,
};
use std::sync::Arc;

/// Long name of the script text input.
pub const SCRIPT_PORT: &str = "script";
/// Long names of the numeric inputs, bound to `a`..`d` in the script.
pub const VARIABLE_PORTS: [&str; 4] = ["variable_a", "variable_b", "variable_c", "variable_d"];
/// Long name of the output port.
pub const OUTPUT_PORT: &str = "output";

/// Result of one compute request.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeStatus {
    /// The output was written (with the fallback value if evaluation failed)
    /// and marked clean.
    Computed(Evaluation),
    /// The requested port is not produced by this node. Nothing was touched.
    InvalidTarget,
}

/// A node instance as seen by a host.
pub trait Node: Send {
    /// Name of the node type this instance belongs to.
    fn type_name(&self) -> &str;

    /// Compute `port` from the inputs in `data`.
    ///
    /// Must never panic or return an error for bad user content; failures
    /// are reported through `sink`.
    fn compute(
        &mut self,
        port: PortId,
        data: &mut DataBlock,
        sink: &dyn DiagnosticSink,
    ) -> ComputeStatus;
}

/// Port ids of the script node, resolved once from its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptPorts {
    pub script: PortId,
    pub variables: [PortId; 4],
    pub output: PortId,
}

impl ScriptPorts {
    pub fn resolve(schema: &AttributeSchema) -> Result<Self> {
        Ok(Self {
            script: schema.resolve(SCRIPT_PORT)?,
            variables: [
                schema.resolve(VARIABLE_PORTS[0])?,
                schema.resolve(VARIABLE_PORTS[1])?,
                schema.resolve(VARIABLE_PORTS[2])?,
                schema.resolve(VARIABLE_PORTS[3])?,
            ],
            output: schema.resolve(OUTPUT_PORT)?,
        })
    }
}

struct CachedCompile {
    source: String,
    result: std::result::Result<CompiledScript, EvaluationFailure>,
}

/// Scripted attribute node: `output = f(script, a, b, c, d)`.
pub struct ScriptNode {
    schema: Arc<AttributeSchema>,
    ports: ScriptPorts,
    engine: Arc<ScriptEngine>,
    compiled: Option<CachedCompile>,
}

impl ScriptNode {
    /// Create an instance for a schema produced by [`ScriptNode::initialize`].
    pub fn new(schema: Arc<AttributeSchema>, engine: Arc<ScriptEngine>) -> Result<Self> {
        let ports = ScriptPorts::resolve(&schema)?;
        Ok(Self {
            schema,
            ports,
            engine,
            compiled: None,
        })
    }

    /// Declare the script text input, four numeric inputs and the output.
    pub fn declare_ports(builder: &mut SchemaBuilder) -> ScriptPorts {
        let script = builder.add_attribute(
            PortDescriptor::input(SCRIPT_PORT, "scr", PortKind::Text)
                .readable(true)
                .writable(true)
                .storable(true),
        );

        let short_names = ["var_a", "var_b", "var_c", "var_d"];
        let variables = [0, 1, 2, 3].map(|i| {
            builder.add_attribute(
                PortDescriptor::input(VARIABLE_PORTS[i], short_names[i], PortKind::Number)
                    .with_default(0.0)
                    .keyable(true),
            )
        });

        let output = builder.add_attribute(PortDescriptor::output(
            OUTPUT_PORT,
            "otp",
            PortKind::Number,
        ));

        ScriptPorts {
            script,
            variables,
            output,
        }
    }

    /// Every input dirties the output.
    pub fn declare_affects(builder: &mut SchemaBuilder, ports: &ScriptPorts) {
        builder.attribute_affects(ports.script, ports.output);
        for variable in ports.variables {
            builder.attribute_affects(variable, ports.output);
        }
    }

    /// Schema initializer passed to [`NodeHost::register_node_type`].
    pub fn initialize(builder: &mut SchemaBuilder) -> Result<()> {
        let ports = Self::declare_ports(builder);
        Self::declare_affects(builder, &ports);
        Ok(())
    }

    /// Register the script node type with a host.
    pub fn register(host: &mut NodeHost, config: &ScriptNodeConfig) -> Result<()> {
        config.validate()?;
        let engine = Arc::new(ScriptEngine::with_limits(config.limits.clone()));
        let factory: NodeFactory =
            Arc::new(move |schema: Arc<AttributeSchema>| -> Result<Box<dyn Node>> {
                let node = ScriptNode::new(schema, engine.clone())?;
                Ok(Box::new(node) as Box<dyn Node>)
            });
        host.register_node_type(
            &config.type_name,
            config.type_id(),
            factory,
            ScriptNode::initialize,
        )
    }

    /// Remove the script node type from a host.
    pub fn unregister(host: &mut NodeHost, config: &ScriptNodeConfig) -> Result<()> {
        host.deregister_node_type(config.type_id())
    }

    pub fn ports(&self) -> &ScriptPorts {
        &self.ports
    }

    pub fn schema(&self) -> &Arc<AttributeSchema> {
        &self.schema
    }

    fn read_inputs(&self, data: &DataBlock) -> Result<(String, Bindings)> {
        let source = data.text(self.ports.script)?.to_string();
        let mut values = [0.0; 4];
        for (value, port) in values.iter_mut().zip(self.ports.variables) {
            *value = data.number(port)?;
        }
        Ok((source, Bindings::from(values)))
    }

    fn evaluate(
        &mut self,
        source: &str,
        bindings: Bindings,
    ) -> std::result::Result<f64, EvaluationFailure> {
        let stale = self
            .compiled
            .as_ref()
            .map_or(true, |cached| cached.source != source);
        if stale {
            let result = self.engine.compile(source);
            if let Err(e) = &result {
                tracing::debug!(node = self.schema.type_name(), "Script failed to compile: {}", e);
            }
            self.compiled = Some(CachedCompile {
                source: source.to_string(),
                result,
            });
        }

        match self.compiled.as_ref().map(|cached| &cached.result) {
            Some(Ok(script)) => self.engine.run(script, bindings),
            Some(Err(failure)) => Err(failure.clone()),
            None => self.engine.try_evaluate(source, bindings),
        }
    }
}

impl Node for ScriptNode {
    fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    fn compute(
        &mut self,
        port: PortId,
        data: &mut DataBlock,
        sink: &dyn DiagnosticSink,
    ) -> ComputeStatus {
        if port != self.ports.output {
            tracing::debug!(
                node = self.schema.type_name(),
                "Ignoring compute for {}, not produced by this node",
                port
            );
            return ComputeStatus::InvalidTarget;
        }

        let evaluation = match self.read_inputs(data) {
            Ok((source, bindings)) => Evaluation::from(self.evaluate(&source, bindings)),
            Err(e) => Evaluation::from(Err(EvaluationFailure::new(
                FailureKind::Runtime,
                format!("failed to read inputs: {}", e),
            ))),
        };

        match &evaluation.failure {
            Some(failure) => sink.report(
                DiagnosticLevel::Error,
                &format!("[{}] Error: {}", self.schema.type_name(), failure),
            ),
            None => tracing::trace!(
                node = self.schema.type_name(),
                value = evaluation.value,
                "Computed output"
            ),
        }

        if let Err(e) = data.set_output_number(port, evaluation.value) {
            sink.report(
                DiagnosticLevel::Error,
                &format!("[{}] Error: failed to write output: {}", self.schema.type_name(), e),
            );
        }
        data.set_clean(port);

        ComputeStatus::Computed(evaluation)
    }
}

impl std::fmt::Debug for ScriptNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptNode")
            .field("type_name", &self.schema.type_name())
            .field(
                "compiled",
                &self.compiled.as_ref().map(|c| c.result.is_ok()),
            )
            .finish()
    }
}
