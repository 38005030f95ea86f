//! End-to-end tests driving the script node through `NodeHost`

mod common;

use common::{assert_float_eq, TestHost};
use script_node::{
    ComputeStatus, FailureKind, PortValue, ScriptEngine, ScriptNode, ScriptNodeError,
};
use std::sync::Arc;

#[test]
fn test_sum_of_two_inputs() {
    let mut t = TestHost::new();
    let id = t.create_with("output = a + b", [2.0, 3.0, 0.0, 0.0]);

    assert_float_eq(t.output(id), 5.0, 1e-12);
    assert!(t.errors().is_empty());
}

#[test]
fn test_polynomial_uses_all_inputs() {
    let mut t = TestHost::new();
    let id = t.create_with("output = a * b + c - d / 2.0", [2.0, 4.0, 1.0, 3.0]);

    assert_float_eq(t.output(id), 7.5, 1e-12);
}

#[test]
fn test_fresh_instance_computes_zero() {
    let mut t = TestHost::new();
    let id = t.create();

    assert!(t.host.is_dirty(id, "output").unwrap());
    assert_eq!(t.output(id), 0.0);
    assert!(!t.host.is_dirty(id, "output").unwrap());
    assert!(t.errors().is_empty());
}

#[test]
fn test_empty_script_yields_zero_without_error() {
    let mut t = TestHost::new();
    let id = t.create_with("", [1.0, 2.0, 3.0, 4.0]);

    assert_eq!(t.output(id), 0.0);
    assert!(t.errors().is_empty());
}

#[test]
fn test_syntax_error_falls_back_and_reports() {
    let mut t = TestHost::new();
    let id = t.create_with("output = a +", [2.0, 3.0, 0.0, 0.0]);

    assert_eq!(t.output(id), 0.0);
    let errors = t.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("[scriptExecute] Error: parse error"));
}

#[test]
fn test_unused_inputs_do_not_change_result() {
    let mut t = TestHost::new();
    let first = t.create_with("output = a + b", [2.0, 3.0, 0.0, 0.0]);
    let second = t.create_with("output = a + b", [2.0, 3.0, -40.0, 1e9]);

    assert_eq!(t.output(first), t.output(second));
}

#[test]
fn test_sandbox_rejects_unknown_names() {
    let mut t = TestHost::new();
    let id = t.create_with("output = x", [0.0; 4]);

    assert_eq!(t.output(id), 0.0);
    let errors = t.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("name not found"));
}

#[test]
fn test_sandbox_rejects_import() {
    let mut t = TestHost::new();
    let id = t.create_with("import \"os\" as os;\noutput = 1.0;", [0.0; 4]);

    assert_eq!(t.output(id), 0.0);
    assert_eq!(t.errors().len(), 1);
}

#[test]
fn test_runaway_script_is_bounded() {
    let mut t = TestHost::new();
    let id = t.create_with("loop { output += a; }", [1.0, 0.0, 0.0, 0.0]);

    assert_eq!(t.output(id), 0.0);
    let errors = t.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("resource exhausted"));
}

#[test]
fn test_dirty_clean_cycle() {
    let mut t = TestHost::new();
    let id = t.create_with("output = a * 2.0", [1.5, 0.0, 0.0, 0.0]);

    assert!(t.host.is_dirty(id, "output").unwrap());
    assert_eq!(t.output(id), 3.0);
    assert!(!t.host.is_dirty(id, "output").unwrap());

    // Every input is an affects-source of the output.
    for port in ["script", "variable_a", "variable_b", "variable_c", "variable_d"] {
        t.output(id);
        match port {
            "script" => t.host.set_value(id, port, "output = a * 2.0").unwrap(),
            _ => t.host.set_value(id, port, 1.5).unwrap(),
        }
        assert!(t.host.is_dirty(id, "output").unwrap(), "{} must dirty output", port);
    }
}

#[test]
fn test_short_names_address_ports() {
    let mut t = TestHost::new();
    let id = t.create();
    t.host.set_value(id, "scr", "output = a - b").unwrap();
    t.host.set_value(id, "var_a", 10.0).unwrap();
    t.host.set_value(id, "var_b", 4.0).unwrap();

    assert_eq!(t.host.request_value(id, "otp").unwrap(), PortValue::Number(6.0));
}

#[test]
fn test_failed_compute_still_cleans_output() {
    let mut t = TestHost::new();
    let id = t.create_with("output = \"text\"", [0.0; 4]);

    assert_eq!(t.output(id), 0.0);
    assert!(!t.host.is_dirty(id, "output").unwrap());
    assert!(t.errors()[0].contains("non-numeric output"));

    // Clean output is served without recomputing or re-reporting.
    assert_eq!(t.output(id), 0.0);
    assert!(t.errors().is_empty());
}

#[test]
fn test_invalid_target_leaves_instance_untouched() {
    let mut t = TestHost::new();
    let id = t.create_with("output = a", [7.0, 0.0, 0.0, 0.0]);
    assert_eq!(t.output(id), 7.0);

    let status = t.host.compute(id, "variable_a").unwrap();

    assert_eq!(status, ComputeStatus::InvalidTarget);
    assert!(!t.host.is_dirty(id, "output").unwrap());
    assert_eq!(
        t.host.request_value(id, "variable_a").unwrap(),
        PortValue::Number(7.0)
    );
    assert!(t.errors().is_empty());
}

#[test]
fn test_explicit_compute_reports_failure_kind() {
    let mut t = TestHost::new();
    let id = t.create_with("output = if a { 1.0 } else { 2.0 };", [1.0, 0.0, 0.0, 0.0]);

    match t.host.compute(id, "output").unwrap() {
        ComputeStatus::Computed(evaluation) => {
            assert_eq!(evaluation.value, 0.0);
            assert_eq!(evaluation.failure.unwrap().kind, FailureKind::Type);
        }
        ComputeStatus::InvalidTarget => panic!("output is produced by the node"),
    }
}

#[test]
fn test_output_port_is_read_only() {
    let mut t = TestHost::new();
    let id = t.create();

    let err = t.host.set_value(id, "output", 1.0).unwrap_err();
    assert!(matches!(err, ScriptNodeError::ReadOnlyPort(_)));
}

#[test]
fn test_instances_are_independent() {
    let mut t = TestHost::new();
    let good = t.create_with("output = a + 1.0", [1.0, 0.0, 0.0, 0.0]);
    let bad = t.create_with("output = (", [1.0, 0.0, 0.0, 0.0]);

    assert_eq!(t.output(bad), 0.0);
    assert_eq!(t.output(good), 2.0);
    assert_eq!(t.errors().len(), 1);
}

#[test]
fn test_registration_and_teardown() {
    let mut t = TestHost::new();
    let id = t.create();

    let err = ScriptNode::unregister(&mut t.host, &t.config).unwrap_err();
    assert!(matches!(err, ScriptNodeError::NodeTypeInUse { .. }));
    assert!(t.errors()[0].starts_with("Failed to deregister node: scriptExecute"));

    t.host.destroy_node(id).unwrap();
    ScriptNode::unregister(&mut t.host, &t.config).unwrap();
    assert!(!t.host.is_registered(t.config.type_id()));
}

#[test]
fn test_duplicate_registration_is_reported() {
    let mut t = TestHost::new();
    let config = t.config.clone();

    assert!(ScriptNode::register(&mut t.host, &config).is_err());
    let errors = t.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Failed to register node: scriptExecute |"));
}

#[test]
fn test_parallel_instances_share_engine() {
    let t = TestHost::new();
    let schema = t.host.schema("scriptExecute").unwrap().clone();
    let engine = Arc::new(ScriptEngine::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let schema = schema.clone();
            let engine = engine.clone();
            std::thread::spawn(move || {
                use script_node::{DataBlock, Node};
                let (sink, rx) = script_node::ChannelSink::new();
                let mut node = ScriptNode::new(schema.clone(), engine).unwrap();
                let ports = *node.ports();
                let mut data = DataBlock::new(&schema);
                data.set_value(ports.script, PortValue::from("output = a * b"))
                    .unwrap();
                data.set_value(ports.variables[0], PortValue::Number(i as f64))
                    .unwrap();
                data.set_value(ports.variables[1], PortValue::Number(3.0))
                    .unwrap();

                for _ in 0..50 {
                    data.mark_dirty(ports.output);
                    node.compute(ports.output, &mut data, &sink);
                }
                assert_eq!(rx.try_iter().count(), 0);
                data.number(ports.output).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), i as f64 * 3.0);
    }
}
