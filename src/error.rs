//! Error handling for the script node
//!
//! This module defines the crate error type and a Result alias. Evaluation
//! failures have their own type ([`EvaluationFailure`]) because they are
//! recovered inside the node and only surface here when a caller asks the
//! evaluator directly.

use crate::scripting::EvaluationFailure;
use thiserror::Error;

/// Main error type for script node operations
#[derive(Error, Debug)]
pub enum ScriptNodeError {
    /// Malformed port or affects declarations (fatal at registration)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Script failed to parse or run
    #[error("Evaluation failure: {0}")]
    Evaluation(#[from] EvaluationFailure),

    /// Compute requested for a port the node does not produce
    #[error("Invalid compute target: {port}")]
    InvalidTarget { port: String },

    /// No port with this long or short name exists on the node
    #[error("Unknown port: {0}")]
    UnknownPort(String),

    /// Port exists but is not writable by external callers
    #[error("Port is read-only: {0}")]
    ReadOnlyPort(String),

    /// Value kind does not match the port kind
    #[error("Type mismatch on port {port}: expected {expected}")]
    TypeMismatch { port: String, expected: String },

    /// Node type name or id is not registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node type name or id is already registered
    #[error("Node type already registered: {0}")]
    DuplicateNodeType(String),

    /// Node type still has live instances
    #[error("Node type {type_name} still has {instances} live instance(s)")]
    NodeTypeInUse { type_name: String, instances: usize },

    /// Instance handle does not refer to a live node
    #[error("Unknown node instance: {0}")]
    UnknownInstance(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ScriptNodeError>,
    },
}

impl ScriptNodeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ScriptNodeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for script node operations
pub type Result<T> = std::result::Result<T, ScriptNodeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, EvaluationFailure> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ScriptNodeError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ScriptNodeError::from(e).with_context(f()))
    }
}
