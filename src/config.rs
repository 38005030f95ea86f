//! Configuration for the script node type
//!
//! Holds the node type identity used at registration and the limits the
//! sandboxed engine enforces on every run.
//!
//! # File Formats
//!
//! - TOML (default, any extension other than `.json`)
//! - JSON (`.json`)
//!
//! ```toml
//! type_name = "scriptExecute"
//! type_id = 522231
//!
//! [limits]
//! max_operations = 50000
//! max_call_levels = 16
//! ```
//!
//! Missing fields fall back to their defaults.

use crate::error::{Result, ScriptNodeError};
use crate::schema::TypeId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default node type name
pub const DEFAULT_TYPE_NAME: &str = "scriptExecute";

/// Development type id; hosts that persist node types should allocate their own
pub const DEFAULT_TYPE_ID: u32 = 0x0007_F7F7;

/// Default operation budget per evaluation
pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000;

/// Execution limits for the sandboxed engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorLimits {
    /// Maximum operations per run (loops, calls and expressions all count)
    pub max_operations: u64,
    /// Maximum script function call depth
    pub max_call_levels: usize,
    /// Maximum expression nesting at global level
    pub max_expr_depth: usize,
    /// Maximum expression nesting inside functions
    pub max_function_expr_depth: usize,
    /// Maximum string length
    pub max_string_size: usize,
    /// Maximum array length
    pub max_array_size: usize,
    /// Maximum object map size
    pub max_map_size: usize,
}

impl Default for EvaluatorLimits {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
            max_call_levels: 32,
            max_expr_depth: 64,
            max_function_expr_depth: 64,
            max_string_size: 10_000,
            max_array_size: 1_000,
            max_map_size: 1_000,
        }
    }
}

impl EvaluatorLimits {
    /// Reject limits that would leave the engine unbounded.
    ///
    /// Rhai treats a zero limit as "no limit", so zero is never accepted here.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("max_operations", self.max_operations == 0),
            ("max_call_levels", self.max_call_levels == 0),
            ("max_expr_depth", self.max_expr_depth == 0),
            ("max_function_expr_depth", self.max_function_expr_depth == 0),
            ("max_string_size", self.max_string_size == 0),
            ("max_array_size", self.max_array_size == 0),
            ("max_map_size", self.max_map_size == 0),
        ];
        match checks.iter().find(|(_, is_zero)| *is_zero) {
            Some((name, _)) => Err(ScriptNodeError::Config(format!(
                "{} must be greater than zero",
                name
            ))),
            None => Ok(()),
        }
    }
}

/// Node type configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptNodeConfig {
    /// Name hosts use to create instances
    pub type_name: String,
    /// Numeric type id
    pub type_id: u32,
    /// Engine limits
    pub limits: EvaluatorLimits,
}

impl Default for ScriptNodeConfig {
    fn default() -> Self {
        Self {
            type_name: DEFAULT_TYPE_NAME.to_string(),
            type_id: DEFAULT_TYPE_ID,
            limits: EvaluatorLimits::default(),
        }
    }
}

impl ScriptNodeConfig {
    pub fn type_id(&self) -> TypeId {
        TypeId(self.type_id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.type_name.trim().is_empty() {
            return Err(ScriptNodeError::Config(
                "type_name must not be empty".to_string(),
            ));
        }
        self.limits.validate()
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScriptNodeError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = if is_json(path) {
            serde_json::from_str(&content).map_err(|e| {
                ScriptNodeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                ScriptNodeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load a config file, returning defaults if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default script node config: {}", e);
                Self::default()
            }
        }
    }

    /// Save the config to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ScriptNodeError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = if is_json(path) {
            serde_json::to_string_pretty(self)
                .map_err(|e| ScriptNodeError::Config(format!("Failed to serialize config: {}", e)))?
        } else {
            toml::to_string_pretty(self)
                .map_err(|e| ScriptNodeError::Config(format!("Failed to serialize config: {}", e)))?
        };

        std::fs::write(path, content).map_err(|e| {
            ScriptNodeError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
