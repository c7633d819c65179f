//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold ENV_MUTEX so they never
//! interleave.

use phiguard::config::load_config;
use phiguard::deid::DeidEngine;
use phiguard::domain::DeidError;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for var in [
        "PHIGUARD_APPLICATION_LOG_LEVEL",
        "PHIGUARD_DETECTION_RULE_TIMEOUT_MS",
        "PHIGUARD_DETECTION_MIN_CONFIDENCE",
        "PHIGUARD_DETECTION_PARALLEL_RULES",
        "PHIGUARD_AUDIT_ENABLED",
        "PHIGUARD_AUDIT_LOG_PATH",
        "PHIGUARD_LOGGING_LOCAL_ENABLED",
        "TEST_PHIGUARD_AUDIT_DIR",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
name = "phiguard-ward-3"
log_level = "debug"

[detection]
rule_timeout_ms = 100
document_timeout_ms = 5000
parallel_rules = false
min_confidence = 0.8
high_confidence_threshold = 0.95
verify_round_trip = false

[audit]
enabled = true
log_path = "/var/log/phiguard/audit.jsonl"

[logging]
local_enabled = false
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.name, "phiguard-ward-3");
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.detection.rule_timeout_ms, 100);
    assert_eq!(config.detection.document_timeout_ms, 5000);
    assert!(!config.detection.parallel_rules);
    assert_eq!(config.detection.min_confidence, 0.8);
    assert_eq!(config.detection.high_confidence_threshold, 0.95);
    assert!(!config.detection.verify_round_trip);
    assert!(config.audit.enabled);
    assert_eq!(
        config.audit.log_path.to_str(),
        Some("/var/log/phiguard/audit.jsonl")
    );
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_PHIGUARD_AUDIT_DIR", "/srv/audit");

    let file = write_config(
        r#"
[audit]
log_path = "${TEST_PHIGUARD_AUDIT_DIR}/phi_audit.jsonl"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(
        config.audit.log_path.to_str(),
        Some("/srv/audit/phi_audit.jsonl")
    );
    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_configuration_error() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[audit]\nlog_path = \"${TEST_PHIGUARD_AUDIT_DIR}/a.jsonl\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, DeidError::Configuration(_)));
    assert!(err.to_string().contains("TEST_PHIGUARD_AUDIT_DIR"));
}

#[test]
fn test_env_overrides_take_precedence() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("PHIGUARD_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("PHIGUARD_DETECTION_RULE_TIMEOUT_MS", "75");
    std::env::set_var("PHIGUARD_DETECTION_MIN_CONFIDENCE", "0.9");
    std::env::set_var("PHIGUARD_AUDIT_ENABLED", "false");

    let file = write_config(
        r#"
[application]
log_level = "info"

[detection]
rule_timeout_ms = 250
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.detection.rule_timeout_ms, 75);
    assert_eq!(config.detection.min_confidence, 0.9);
    assert!(!config.audit.enabled);
    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("PHIGUARD_DETECTION_PARALLEL_RULES", "sometimes");

    let file = write_config("");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("PHIGUARD_DETECTION_PARALLEL_RULES"));
    cleanup_env_vars();
}

#[test]
fn test_invalid_values_fail_validation() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    for content in [
        "[detection]\nrule_timeout_ms = 0\n",
        "[detection]\nmin_confidence = 1.5\n",
        "[application]\nlog_level = \"loud\"\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ] {
        let file = write_config(content);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            err.to_string().contains("validation failed"),
            "unexpected error for {content:?}: {err}"
        );
    }
}

#[test]
fn test_loaded_config_builds_engine() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[audit]\nenabled = false\n");
    let config = load_config(file.path()).unwrap();
    let engine = DeidEngine::new(config.deid_config()).unwrap();
    assert!(!engine.registry().is_empty());
}
