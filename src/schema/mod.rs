//! Attribute schema: the static shape of a node type.
//!
//! A schema is built once per node type through [`SchemaBuilder`] and then
//! shared (behind an `Arc`) by every instance of that type. It lists the
//! node's ports and the affects-edges a host uses to propagate dirtiness.
//!
//! Schemas describe single-output nodes. `build()` rejects:
//!
//! - duplicate long or short port names
//! - zero or more than one output port
//! - affects-edges that do not run from an input to the output
//! - inputs without exactly one edge to the output

pub mod id;
pub mod port;

pub use id::{InstanceId, PortId, TypeId};
pub use port::{PortDescriptor, PortDirection, PortFlags, PortKind, PortValue};

use crate::error::{Result, ScriptNodeError};
use std::collections::HashSet;

/// Declared relationship: a change to `source` marks `target` dirty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AffectsEdge {
    pub source: PortId,
    pub target: PortId,
}

/// Immutable description of a node type's ports and affects-edges.
#[derive(Debug)]
pub struct AttributeSchema {
    type_name: String,
    type_id: TypeId,
    ports: Vec<PortDescriptor>,
    affects: Vec<AffectsEdge>,
    output: PortId,
}

impl AttributeSchema {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        &self.ports
    }

    pub fn port(&self, id: PortId) -> Option<&PortDescriptor> {
        self.ports.get(id.index())
    }

    pub fn affects(&self) -> &[AffectsEdge] {
        &self.affects
    }

    /// The node's single output port.
    pub fn output(&self) -> PortId {
        self.output
    }

    /// Look up a port by long or short name.
    pub fn find(&self, name: &str) -> Option<PortId> {
        self.ports
            .iter()
            .position(|p| p.matches(name))
            .map(|i| PortId(i as u16))
    }

    /// Like [`find`](Self::find), but unknown names are an error.
    pub fn resolve(&self, name: &str) -> Result<PortId> {
        self.find(name)
            .ok_or_else(|| ScriptNodeError::UnknownPort(name.to_string()))
    }

    /// Ports that become dirty when `source` changes.
    pub fn affected_by(&self, source: PortId) -> impl Iterator<Item = PortId> + '_ {
        self.affects
            .iter()
            .filter(move |e| e.source == source)
            .map(|e| e.target)
    }

    pub fn inputs(&self) -> impl Iterator<Item = (PortId, &PortDescriptor)> {
        self.ports
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_input())
            .map(|(i, p)| (PortId(i as u16), p))
    }
}

/// Collects port and affects declarations, validated by [`build`](Self::build).
#[derive(Debug)]
pub struct SchemaBuilder {
    type_name: String,
    type_id: TypeId,
    ports: Vec<PortDescriptor>,
    affects: Vec<AffectsEdge>,
}

impl SchemaBuilder {
    pub fn new(type_name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            type_name: type_name.into(),
            type_id,
            ports: Vec::new(),
            affects: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Add a port and return its id.
    pub fn add_attribute(&mut self, port: PortDescriptor) -> PortId {
        let id = PortId(self.ports.len() as u16);
        self.ports.push(port);
        id
    }

    /// Declare that changes to `source` dirty `target`.
    pub fn attribute_affects(&mut self, source: PortId, target: PortId) {
        self.affects.push(AffectsEdge { source, target });
    }

    pub fn build(self) -> Result<AttributeSchema> {
        let mut names = HashSet::new();
        for port in &self.ports {
            if !names.insert(port.name) {
                return Err(self.schema_error(format!("duplicate port name '{}'", port.name)));
            }
            if port.short_name != port.name && !names.insert(port.short_name) {
                return Err(self.schema_error(format!(
                    "duplicate port name '{}'",
                    port.short_name
                )));
            }
            if port.default.kind() != port.kind {
                return Err(self.schema_error(format!(
                    "default for '{}' is {}, port is {}",
                    port.name,
                    port.default.kind(),
                    port.kind
                )));
            }
        }

        let outputs: Vec<usize> = self
            .ports
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_output())
            .map(|(i, _)| i)
            .collect();
        let output = match outputs.as_slice() {
            [single] => PortId(*single as u16),
            [] => return Err(self.schema_error("no output port declared".to_string())),
            _ => {
                return Err(self.schema_error(format!(
                    "{} output ports declared, expected exactly one",
                    outputs.len()
                )))
            }
        };

        let mut seen = HashSet::new();
        for edge in &self.affects {
            let source = self.ports.get(edge.source.index()).ok_or_else(|| {
                self.schema_error(format!("affects source {} out of range", edge.source))
            })?;
            if !source.is_input() {
                return Err(self.schema_error(format!(
                    "affects source '{}' is not an input",
                    source.name
                )));
            }
            if edge.target != output {
                return Err(self.schema_error(format!(
                    "affects target {} of '{}' is not the output port",
                    edge.target, source.name
                )));
            }
            if !seen.insert(*edge) {
                return Err(self.schema_error(format!(
                    "duplicate affects edge from '{}'",
                    source.name
                )));
            }
        }

        for (i, port) in self.ports.iter().enumerate() {
            if port.is_input() && !self.affects.iter().any(|e| e.source.index() == i) {
                return Err(self.schema_error(format!(
                    "input '{}' does not affect the output",
                    port.name
                )));
            }
        }

        Ok(AttributeSchema {
            type_name: self.type_name,
            type_id: self.type_id,
            ports: self.ports,
            affects: self.affects,
            output,
        })
    }

    fn schema_error(&self, message: String) -> ScriptNodeError {
        ScriptNodeError::Schema(format!("{}: {}", self.type_name, message))
    }
}
