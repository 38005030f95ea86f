//! Tracing subscriber setup for hosts that do not install their own.
//!
//! The node itself only emits `tracing` events; embedding hosts usually
//! already have a subscriber. These helpers exist for standalone hosts and
//! test harnesses.

use crate::error::{Result, ScriptNodeError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,script_node=debug";

/// Install a global fmt subscriber filtered by `RUST_LOG` or `default_filter`.
///
/// Fails if a global subscriber is already installed.
pub fn try_init(default_filter: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| ScriptNodeError::Config(format!("Failed to install tracing subscriber: {}", e)))
}

/// Like [`try_init`] with [`DEFAULT_FILTER`], ignoring an existing subscriber.
pub fn init() {
    if let Err(e) = try_init(DEFAULT_FILTER) {
        tracing::debug!("{}", e);
    }
}
