//! Minimal in-process host for driving nodes.
//!
//! Real graph engines own scheduling and persistence; `NodeHost` implements
//! just the collaborator contract a node relies on:
//!
//! - node type registration with a one-time schema initializer
//! - per-instance `DataBlock` storage
//! - dirty propagation along affects-edges when an input is set
//! - compute on request when the output is dirty
//!
//! ```ignore
//! use script_node::{host::NodeHost, node::ScriptNode, ScriptNodeConfig};
//!
//! let mut host = NodeHost::with_tracing();
//! ScriptNode::register(&mut host, &ScriptNodeConfig::default())?;
//!
//! let node = host.create_node("scriptExecute")?;
//! host.set_value(node, "script", "output = a + b")?;
//! host.set_value(node, "variable_a", 2.0)?;
//! host.set_value(node, "variable_b", 3.0)?;
//! assert_eq!(host.request_value(node, "output")?.as_number(), Some(5.0));
//! ```

use crate::diagnostics::{DiagnosticLevel, DiagnosticSink, TracingSink};
use crate::error::{Result, ScriptNodeError};
use crate::node::{ComputeStatus, DataBlock, Node};
use crate::schema::{AttributeSchema, InstanceId, PortId, PortValue, SchemaBuilder, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Creates a node instance for a registered schema.
pub type NodeFactory = Arc<dyn Fn(Arc<AttributeSchema>) -> Result<Box<dyn Node>> + Send + Sync>;

struct NodeTypeEntry {
    schema: Arc<AttributeSchema>,
    factory: NodeFactory,
}

struct NodeInstance {
    type_id: TypeId,
    schema: Arc<AttributeSchema>,
    node: Box<dyn Node>,
    data: DataBlock,
}

pub struct NodeHost {
    types: HashMap<TypeId, NodeTypeEntry>,
    instances: Vec<Option<NodeInstance>>,
    sink: Arc<dyn DiagnosticSink>,
}

impl NodeHost {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            types: HashMap::new(),
            instances: Vec::new(),
            sink,
        }
    }

    /// Host that reports diagnostics through `tracing`.
    pub fn with_tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// Register a node type.
    ///
    /// `initializer` runs exactly once, here, to declare the type's schema.
    /// Success and failure are both reported to the diagnostic sink.
    pub fn register_node_type<F>(
        &mut self,
        type_name: &str,
        type_id: TypeId,
        factory: NodeFactory,
        initializer: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut SchemaBuilder) -> Result<()>,
    {
        match self.try_register(type_name, type_id, factory, initializer) {
            Ok(()) => {
                self.sink.report(
                    DiagnosticLevel::Info,
                    &format!("Registered node: {}", type_name),
                );
                Ok(())
            }
            Err(e) => {
                self.sink.report(
                    DiagnosticLevel::Error,
                    &format!("Failed to register node: {} | {}", type_name, e),
                );
                Err(e)
            }
        }
    }

    fn try_register<F>(
        &mut self,
        type_name: &str,
        type_id: TypeId,
        factory: NodeFactory,
        initializer: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut SchemaBuilder) -> Result<()>,
    {
        if self.types.contains_key(&type_id) {
            return Err(ScriptNodeError::DuplicateNodeType(type_id.to_string()));
        }
        if self.find_type(type_name).is_some() {
            return Err(ScriptNodeError::DuplicateNodeType(type_name.to_string()));
        }

        let mut builder = SchemaBuilder::new(type_name, type_id);
        initializer(&mut builder)?;
        let schema = Arc::new(builder.build()?);

        tracing::debug!(
            node = type_name,
            ports = schema.ports().len(),
            affects = schema.affects().len(),
            "Node type schema built"
        );

        self.types.insert(type_id, NodeTypeEntry { schema, factory });
        Ok(())
    }

    /// Remove a node type. Fails while instances of it are alive.
    pub fn deregister_node_type(&mut self, type_id: TypeId) -> Result<()> {
        let result = self.try_deregister(type_id);
        if let Err(e) = &result {
            let name = self
                .types
                .get(&type_id)
                .map(|t| t.schema.type_name().to_string())
                .unwrap_or_else(|| type_id.to_string());
            self.sink.report(
                DiagnosticLevel::Error,
                &format!("Failed to deregister node: {} | {}", name, e),
            );
        }
        result
    }

    fn try_deregister(&mut self, type_id: TypeId) -> Result<()> {
        let entry = self
            .types
            .get(&type_id)
            .ok_or_else(|| ScriptNodeError::UnknownNodeType(type_id.to_string()))?;
        let live = self.instances.iter().flatten().filter(|i| i.type_id == type_id).count();
        if live > 0 {
            return Err(ScriptNodeError::NodeTypeInUse {
                type_name: entry.schema.type_name().to_string(),
                instances: live,
            });
        }
        self.types.remove(&type_id);
        Ok(())
    }

    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.types.contains_key(&type_id)
    }

    /// Shared schema of a registered node type.
    pub fn schema(&self, type_name: &str) -> Option<&Arc<AttributeSchema>> {
        self.find_type(type_name).map(|t| &t.schema)
    }

    fn find_type(&self, type_name: &str) -> Option<&NodeTypeEntry> {
        self.types
            .values()
            .find(|t| t.schema.type_name() == type_name)
    }

    /// Instantiate a registered node type.
    pub fn create_node(&mut self, type_name: &str) -> Result<InstanceId> {
        let entry = self
            .find_type(type_name)
            .ok_or_else(|| ScriptNodeError::UnknownNodeType(type_name.to_string()))?;

        let schema = entry.schema.clone();
        let node = (entry.factory)(schema.clone())?;
        let instance = NodeInstance {
            type_id: schema.type_id(),
            data: DataBlock::new(&schema),
            schema,
            node,
        };

        let id = InstanceId(self.instances.len() as u32);
        self.instances.push(Some(instance));
        tracing::debug!(node = type_name, "Created {}", id);
        Ok(id)
    }

    pub fn destroy_node(&mut self, id: InstanceId) -> Result<()> {
        let slot = self
            .instances
            .get_mut(id.index())
            .filter(|slot| slot.is_some())
            .ok_or_else(|| ScriptNodeError::UnknownInstance(id.to_string()))?;
        *slot = None;
        Ok(())
    }

    pub fn instance_count(&self) -> usize {
        self.instances.iter().flatten().count()
    }

    fn instance(&self, id: InstanceId) -> Result<&NodeInstance> {
        self.instances
            .get(id.index())
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| ScriptNodeError::UnknownInstance(id.to_string()))
    }

    fn instance_mut(&mut self, id: InstanceId) -> Result<&mut NodeInstance> {
        self.instances
            .get_mut(id.index())
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| ScriptNodeError::UnknownInstance(id.to_string()))
    }

    /// Set an input port and dirty everything it affects.
    pub fn set_value(
        &mut self,
        id: InstanceId,
        port_name: &str,
        value: impl Into<PortValue>,
    ) -> Result<()> {
        let instance = self.instance_mut(id)?;
        let port = instance.schema.resolve(port_name)?;
        let descriptor = instance
            .schema
            .port(port)
            .ok_or_else(|| ScriptNodeError::UnknownPort(port_name.to_string()))?;
        if !descriptor.is_input() || !descriptor.flags.writable {
            return Err(ScriptNodeError::ReadOnlyPort(descriptor.name.to_string()));
        }

        let value: PortValue = value.into();
        if value.kind() != descriptor.kind {
            return Err(ScriptNodeError::TypeMismatch {
                port: descriptor.name.to_string(),
                expected: descriptor.kind.to_string(),
            });
        }

        instance.data.set_value(port, value)?;
        let targets: Vec<PortId> = instance.schema.affected_by(port).collect();
        for target in targets {
            instance.data.mark_dirty(target);
        }
        tracing::trace!(node = instance.node.type_name(), port = port_name, "Input set");
        Ok(())
    }

    /// Read a port, computing it first if it is a dirty output.
    pub fn request_value(&mut self, id: InstanceId, port_name: &str) -> Result<PortValue> {
        let sink = self.sink.clone();
        let instance = self.instance_mut(id)?;
        let port = instance.schema.resolve(port_name)?;

        let is_output = instance.schema.port(port).is_some_and(|p| p.is_output());
        if is_output && !instance.data.is_clean(port) {
            instance.node.compute(port, &mut instance.data, sink.as_ref());
        }

        instance.data.value(port).cloned()
    }

    /// Invoke compute for a port unconditionally.
    ///
    /// Requests for ports the node does not produce come back as
    /// [`ComputeStatus::InvalidTarget`] and leave the instance untouched.
    pub fn compute(&mut self, id: InstanceId, port_name: &str) -> Result<ComputeStatus> {
        let sink = self.sink.clone();
        let instance = self.instance_mut(id)?;
        let port = instance.schema.resolve(port_name)?;
        Ok(instance.node.compute(port, &mut instance.data, sink.as_ref()))
    }

    /// Whether a port's stored value is stale.
    pub fn is_dirty(&self, id: InstanceId, port_name: &str) -> Result<bool> {
        let instance = self.instance(id)?;
        let port = instance.schema.resolve(port_name)?;
        Ok(!instance.data.is_clean(port))
    }
}

impl Default for NodeHost {
    fn default() -> Self {
        Self::with_tracing()
    }
}

impl std::fmt::Debug for NodeHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHost")
            .field("types", &self.types.len())
            .field("instances", &self.instance_count())
            .finish()
    }
}
