//! Port descriptors for the node schema.
//!
//! Each node type declares its ports once, at registration. Descriptors carry
//! the static shape of a port (names, kind, direction, default and access
//! flags); per-instance values live in a `DataBlock`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of value a port holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortKind {
    /// Opaque string (script text).
    Text,
    /// Floating point number.
    Number,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortKind::Text => write!(f, "Text"),
            PortKind::Number => write!(f, "Number"),
        }
    }
}

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

/// A value stored in a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    Text(String),
    Number(f64),
}

impl PortValue {
    pub fn kind(&self) -> PortKind {
        match self {
            PortValue::Text(_) => PortKind::Text,
            PortValue::Number(_) => PortKind::Number,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PortValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PortValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Zero value for a port kind.
    pub fn zero(kind: PortKind) -> Self {
        match kind {
            PortKind::Text => PortValue::Text(String::new()),
            PortKind::Number => PortValue::Number(0.0),
        }
    }
}

impl From<f64> for PortValue {
    fn from(v: f64) -> Self {
        PortValue::Number(v)
    }
}

impl From<&str> for PortValue {
    fn from(v: &str) -> Self {
        PortValue::Text(v.to_string())
    }
}

impl From<String> for PortValue {
    fn from(v: String) -> Self {
        PortValue::Text(v)
    }
}

/// Access flags for a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortFlags {
    /// Value can be read by connections and callers.
    pub readable: bool,
    /// Value can be set by external callers.
    pub writable: bool,
    /// Value is saved by the host's persistence.
    pub storable: bool,
    /// Value can be animated by the host.
    pub keyable: bool,
}

impl Default for PortFlags {
    fn default() -> Self {
        Self {
            readable: true,
            writable: true,
            storable: true,
            keyable: false,
        }
    }
}

/// Static descriptor for a node's port.
#[derive(Debug, Clone)]
pub struct PortDescriptor {
    pub name: &'static str,
    pub short_name: &'static str,
    pub direction: PortDirection,
    pub kind: PortKind,
    pub default: PortValue,
    pub flags: PortFlags,
}

impl PortDescriptor {
    pub fn input(name: &'static str, short_name: &'static str, kind: PortKind) -> Self {
        Self {
            name,
            short_name,
            direction: PortDirection::Input,
            kind,
            default: PortValue::zero(kind),
            flags: PortFlags::default(),
        }
    }

    /// Output ports are derived values: not writable and not storable.
    pub fn output(name: &'static str, short_name: &'static str, kind: PortKind) -> Self {
        Self {
            name,
            short_name,
            direction: PortDirection::Output,
            kind,
            default: PortValue::zero(kind),
            flags: PortFlags {
                readable: true,
                writable: false,
                storable: false,
                keyable: false,
            },
        }
    }

    pub fn with_default(mut self, default: impl Into<PortValue>) -> Self {
        self.default = default.into();
        self
    }

    pub fn keyable(mut self, keyable: bool) -> Self {
        self.flags.keyable = keyable;
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.flags.writable = writable;
        self
    }

    pub fn storable(mut self, storable: bool) -> Self {
        self.flags.storable = storable;
        self
    }

    pub fn readable(mut self, readable: bool) -> Self {
        self.flags.readable = readable;
        self
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// Matches either the long or the short name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.short_name == name
    }
}
