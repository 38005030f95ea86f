//! # script-node: scripted attribute node
//!
//! A dependency-graph node whose single numeric output is produced by a
//! user-authored script. The script reads four numeric inputs (`a`, `b`,
//! `c`, `d`) and assigns its result to `output`. Any failure (syntax error,
//! unknown name, runtime error, exhausted budget) is reported to a
//! diagnostic sink and the output falls back to `0.0`, so a bad script
//! never takes the host down.
//!
//! ## Architecture
//!
//! - **Schema**: ports and affects-edges are declared once per node type and
//!   shared by every instance
//! - **Scripting**: a sandboxed Rhai engine with an operation budget
//! - **Node**: the compute entry point, writing the output and marking it clean
//! - **Host**: a minimal in-process host that tracks dirty state and calls compute
//! - **Diagnostics**: `tracing` or crossbeam channel sinks for node messages
//!
//! ## Example
//!
//! ```ignore
//! use script_node::{NodeHost, ScriptNode, ScriptNodeConfig};
//!
//! fn main() -> script_node::Result<()> {
//!     script_node::logging::init();
//!
//!     let config = ScriptNodeConfig::load_or_default("script_node.toml");
//!     let mut host = NodeHost::with_tracing();
//!     ScriptNode::register(&mut host, &config)?;
//!
//!     let node = host.create_node(&config.type_name)?;
//!     host.set_value(node, "script", "output = a * b + c")?;
//!     host.set_value(node, "variable_a", 2.0)?;
//!     host.set_value(node, "variable_b", 4.0)?;
//!     host.set_value(node, "variable_c", 1.0)?;
//!
//!     let value = host.request_value(node, "output")?;
//!     assert_eq!(value.as_number(), Some(9.0));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod logging;
pub mod node;
pub mod schema;
pub mod scripting;

// Re-export commonly used types
pub use config::{EvaluatorLimits, ScriptNodeConfig};
pub use diagnostics::{ChannelSink, Diagnostic, DiagnosticLevel, DiagnosticSink, TracingSink};
pub use error::{Result, ResultExt, ScriptNodeError};
pub use host::{NodeFactory, NodeHost};
pub use node::{ComputeStatus, DataBlock, Node, ScriptNode, ScriptPorts};
pub use schema::{
    AttributeSchema, InstanceId, PortDescriptor, PortId, PortKind, PortValue, SchemaBuilder, TypeId,
};
pub use scripting::{
    Bindings, CompiledScript, Evaluation, EvaluationFailure, FailureKind, ScriptEngine,
};
