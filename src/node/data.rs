//! Per-instance port storage.
//!
//! A `DataBlock` holds one value per schema port plus a clean flag. Inputs
//! are written by the host; outputs are written by the node's compute entry
//! point, which then marks them clean. Outputs start dirty so the first
//! request always computes.

use crate::error::{Result, ScriptNodeError};
use crate::schema::{AttributeSchema, PortId, PortKind, PortValue};

#[derive(Debug, Clone)]
pub struct DataBlock {
    values: Vec<PortValue>,
    clean: Vec<bool>,
}

impl DataBlock {
    /// Create storage initialised from the schema defaults.
    pub fn new(schema: &AttributeSchema) -> Self {
        let values = schema.ports().iter().map(|p| p.default.clone()).collect();
        let clean = schema.ports().iter().map(|p| p.is_input()).collect();
        Self { values, clean }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, port: PortId) -> Result<&PortValue> {
        self.values
            .get(port.index())
            .ok_or_else(|| ScriptNodeError::UnknownPort(port.to_string()))
    }

    pub fn number(&self, port: PortId) -> Result<f64> {
        self.value(port)?
            .as_number()
            .ok_or_else(|| mismatch(port, PortKind::Number))
    }

    pub fn text(&self, port: PortId) -> Result<&str> {
        self.value(port)?
            .as_text()
            .ok_or_else(|| mismatch(port, PortKind::Text))
    }

    /// Store a value without touching any clean flag.
    pub fn set_value(&mut self, port: PortId, value: PortValue) -> Result<()> {
        let slot = self
            .values
            .get_mut(port.index())
            .ok_or_else(|| ScriptNodeError::UnknownPort(port.to_string()))?;
        if slot.kind() != value.kind() {
            return Err(mismatch(port, slot.kind()));
        }
        *slot = value;
        Ok(())
    }

    pub fn set_output_number(&mut self, port: PortId, value: f64) -> Result<()> {
        self.set_value(port, PortValue::Number(value))
    }

    pub fn is_clean(&self, port: PortId) -> bool {
        self.clean.get(port.index()).copied().unwrap_or(false)
    }

    pub fn set_clean(&mut self, port: PortId) {
        if let Some(flag) = self.clean.get_mut(port.index()) {
            *flag = true;
        }
    }

    pub fn mark_dirty(&mut self, port: PortId) {
        if let Some(flag) = self.clean.get_mut(port.index()) {
            *flag = false;
        }
    }
}

fn mismatch(port: PortId, expected: PortKind) -> ScriptNodeError {
    ScriptNodeError::TypeMismatch {
        port: port.to_string(),
        expected: expected.to_string(),
    }
}
