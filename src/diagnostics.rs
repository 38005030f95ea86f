//! Diagnostic sinks
//!
//! The node classifies what happened (registration success or failure,
//! evaluation failures) and hands a `(level, message)` pair to a sink. The
//! host decides how to present it.
//!
//! - [`TracingSink`] - forwards to `tracing`
//! - [`ChannelSink`] - forwards over a crossbeam channel so another thread
//!   (or a test) can drain the messages

use crossbeam_channel::{Receiver, Sender};
use std::fmt;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic as delivered by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Receiver of node diagnostics.
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, level: DiagnosticLevel, message: &str);
}

/// Forwards diagnostics to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, level: DiagnosticLevel, message: &str) {
        match level {
            DiagnosticLevel::Info => tracing::info!(target: "script_node::diagnostics", "{}", message),
            DiagnosticLevel::Error => {
                tracing::error!(target: "script_node::diagnostics", "{}", message)
            }
        }
    }
}

/// Forwards diagnostics over an unbounded crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Diagnostic>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, Receiver<Diagnostic>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl DiagnosticSink for ChannelSink {
    fn report(&self, level: DiagnosticLevel, message: &str) {
        let diagnostic = Diagnostic {
            level,
            message: message.to_string(),
        };
        if self.tx.send(diagnostic).is_err() {
            tracing::trace!("Diagnostic receiver dropped: [{}] {}", level, message);
        }
    }
}
