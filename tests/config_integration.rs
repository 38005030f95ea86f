//! Configuration and logging setup tests

mod common;

use common::TestHost;
use script_node::{EvaluatorLimits, ScriptNodeConfig};
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn test_toml_config_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("script_node.toml");
    let config = ScriptNodeConfig {
        type_name: "rampNode".to_string(),
        type_id: 0x0010_0001,
        limits: EvaluatorLimits {
            max_operations: 2_000,
            ..EvaluatorLimits::default()
        },
    };

    config.save(&path).unwrap();
    let loaded = ScriptNodeConfig::load(&path).unwrap();

    assert_eq!(loaded.type_name, "rampNode");
    assert_eq!(loaded.type_id, 0x0010_0001);
    assert_eq!(loaded.limits.max_operations, 2_000);
}

#[test]
fn test_partial_json_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("node.json");
    std::fs::write(&path, r#"{ "limits": { "max_operations": 500 } }"#).unwrap();

    let loaded = ScriptNodeConfig::load(&path).unwrap();

    assert_eq!(loaded.type_name, ScriptNodeConfig::default().type_name);
    assert_eq!(loaded.limits.max_operations, 500);
    assert_eq!(
        loaded.limits.max_call_levels,
        EvaluatorLimits::default().max_call_levels
    );
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = ScriptNodeConfig::load_or_default(dir.path().join("absent.toml"));

    assert_eq!(loaded.type_name, "scriptExecute");
    assert_eq!(loaded.type_id, 0x0007_F7F7);
}

#[test]
fn test_configured_type_name_and_budget_apply() {
    let config = ScriptNodeConfig {
        type_name: "tightNode".to_string(),
        type_id: 0x0010_0002,
        limits: EvaluatorLimits {
            max_operations: 50,
            ..EvaluatorLimits::default()
        },
    };
    let mut t = TestHost::with_config(config);

    let cheap = t.create_with("output = a + b", [1.0, 2.0, 0.0, 0.0]);
    let costly = t.create_with(
        "let n = 0; while n < 1000 { n += 1; } output = n;",
        [0.0; 4],
    );

    assert_eq!(t.output(cheap), 3.0);
    assert_eq!(t.output(costly), 0.0);
    let errors = t.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("[tightNode] Error: resource exhausted"));
}

#[test]
fn test_zero_budget_is_rejected() {
    let config = ScriptNodeConfig {
        limits: EvaluatorLimits {
            max_operations: 0,
            ..EvaluatorLimits::default()
        },
        ..ScriptNodeConfig::default()
    };

    assert!(config.validate().is_err());
    let mut host = script_node::NodeHost::default();
    assert!(script_node::ScriptNode::register(&mut host, &config).is_err());
}

#[test]
#[serial]
fn test_logging_init_is_idempotent() {
    script_node::logging::init();
    script_node::logging::init();
    assert!(script_node::logging::try_init(script_node::logging::DEFAULT_FILTER).is_err());
}
