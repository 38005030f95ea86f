//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use crossbeam_channel::Receiver;
use script_node::{
    ChannelSink, Diagnostic, DiagnosticLevel, InstanceId, NodeHost, ScriptNode, ScriptNodeConfig,
};
use std::sync::Arc;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Host with the script node registered under the default config, reporting
/// to a channel the test can drain.
pub struct TestHost {
    pub host: NodeHost,
    pub diagnostics: Receiver<Diagnostic>,
    pub config: ScriptNodeConfig,
}

impl TestHost {
    pub fn new() -> Self {
        Self::with_config(ScriptNodeConfig::default())
    }

    pub fn with_config(config: ScriptNodeConfig) -> Self {
        let (sink, diagnostics) = ChannelSink::new();
        let mut host = NodeHost::new(Arc::new(sink));
        ScriptNode::register(&mut host, &config).expect("script node registers");
        // Drop the registration message so tests only see what they cause.
        let _ = diagnostics.try_iter().count();
        Self {
            host,
            diagnostics,
            config,
        }
    }

    pub fn create(&mut self) -> InstanceId {
        self.host
            .create_node(&self.config.type_name)
            .expect("node instance")
    }

    /// Create an instance with a script and all four inputs set.
    pub fn create_with(&mut self, script: &str, inputs: [f64; 4]) -> InstanceId {
        let id = self.create();
        self.set_inputs(id, script, inputs);
        id
    }

    pub fn set_inputs(&mut self, id: InstanceId, script: &str, inputs: [f64; 4]) {
        self.host.set_value(id, "script", script).unwrap();
        for (name, value) in ["variable_a", "variable_b", "variable_c", "variable_d"]
            .iter()
            .zip(inputs)
        {
            self.host.set_value(id, name, value).unwrap();
        }
    }

    pub fn output(&mut self, id: InstanceId) -> f64 {
        self.host
            .request_value(id, "output")
            .unwrap()
            .as_number()
            .expect("numeric output")
    }

    pub fn errors(&self) -> Vec<String> {
        self.diagnostics
            .try_iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .map(|d| d.message)
            .collect()
    }
}
