//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use phigate::config::{load_config, AuditSinkKind};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const KEY_V1: &str = "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=";
const KEY_V2: &str = "AgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgI=";

fn cleanup_env_vars() {
    for var in [
        "PHIGATE_APPLICATION_LOG_LEVEL",
        "PHIGATE_ENVIRONMENT",
        "PHIGATE_AUDIT_SINK",
        "PHIGATE_RETENTION_PHI_RETENTION_DAYS",
        "PHIGATE_COMPLIANCE_STORE_SSL_MODE",
        "TEST_PHIGATE_KEY_V1",
        "TEST_PHIGATE_PG_PASSWORD",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn base_config() -> String {
    format!(
        r#"
environment = "staging"

[application]
log_level = "debug"

[encryption]
current_key_version = "v2"
index_pepper = "integration-test-pepper"

[encryption.keys]
v1 = "{KEY_V1}"
v2 = "{KEY_V2}"

[compliance_store]
connection_string = "postgresql://phigate:secret@db:5432/compliance"
max_connections = 20
ssl_mode = "verify-full"

[general_store]
connection_string = "postgresql://phigate:secret@db:5432/app"

[audit]
sink = "file"
file_path = "/var/lib/phigate/audit.jsonl"

[retention]
phi_retention_days = 2555
audit_retention_days = 3650
consent_grace_days = 14
schedule_interval_seconds = 600
batch_limit = 250
"#
    )
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(&base_config());
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.encryption.current_key_version, "v2");
    assert_eq!(config.encryption.keys.len(), 2);
    assert_eq!(config.compliance_store.max_connections, 20);
    assert_eq!(config.compliance_store.ssl_mode, "verify-full");
    assert_eq!(config.general_store.ssl_mode, "require");
    assert_eq!(config.audit.sink, AuditSinkKind::File);
    assert_eq!(config.retention.consent_grace_days, 14);
    assert_eq!(config.retention.batch_limit, 250);
}

#[test]
fn test_env_var_substitution_for_secrets() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_PHIGATE_KEY_V1", KEY_V1);
    std::env::set_var("TEST_PHIGATE_PG_PASSWORD", "s3cret");

    let contents = base_config()
        .replace(&format!("v1 = \"{KEY_V1}\""), "v1 = \"${TEST_PHIGATE_KEY_V1}\"")
        .replace(
            "phigate:secret@db:5432/compliance",
            "phigate:${TEST_PHIGATE_PG_PASSWORD}@db:5432/compliance",
        );
    let file = write_config(&contents);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.encryption.keys["v1"].expose_secret().as_str(), KEY_V1);
    assert!(config
        .compliance_store
        .connection_string
        .expose_secret()
        .contains("s3cret"));

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let contents = base_config().replace(
        "index_pepper = \"integration-test-pepper\"",
        "index_pepper = \"${TEST_PHIGATE_UNSET_PEPPER}\"",
    );
    let file = write_config(&contents);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_PHIGATE_UNSET_PEPPER"));
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("PHIGATE_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("PHIGATE_AUDIT_SINK", "postgresql");
    std::env::set_var("PHIGATE_RETENTION_PHI_RETENTION_DAYS", "3000");

    let file = write_config(&base_config());
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.audit.sink, AuditSinkKind::PostgreSQL);
    assert_eq!(config.retention.phi_retention_days, 3000);

    cleanup_env_vars();
}

#[test]
fn test_production_rejects_insecure_settings() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("PHIGATE_ENVIRONMENT", "production");
    std::env::set_var("PHIGATE_COMPLIANCE_STORE_SSL_MODE", "disable");

    let file = write_config(&base_config());
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("ssl_mode"));

    std::env::remove_var("PHIGATE_COMPLIANCE_STORE_SSL_MODE");
    std::env::set_var("PHIGATE_AUDIT_SINK", "memory");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("memory"));

    cleanup_env_vars();
}

#[test]
fn test_invalid_values_are_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        (
            "audit_retention_days = 3650",
            "audit_retention_days = 365",
            "audit_retention_days",
        ),
        (
            "current_key_version = \"v2\"",
            "current_key_version = \"v3\"",
            "current_key_version",
        ),
        (
            "file_path = \"/var/lib/phigate/audit.jsonl\"",
            "",
            "file_path",
        ),
        (
            "ssl_mode = \"verify-full\"",
            "ssl_mode = \"sometimes\"",
            "ssl_mode",
        ),
        (
            "index_pepper = \"integration-test-pepper\"",
            "index_pepper = \"short\"",
            "index_pepper",
        ),
    ];

    for (from, to, expected) in cases {
        let file = write_config(&base_config().replace(from, to));
        let err = load_config(file.path()).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in: {err}"
        );
    }
}

#[test]
fn test_invalid_toml_syntax() {
    let file = write_config("[encryption\ncurrent_key_version = ");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_missing_file() {
    assert!(load_config("/nonexistent/phigate.toml").is_err());
}
