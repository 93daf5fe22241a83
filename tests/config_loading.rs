//! Config Loading Tests
//!
//! Parses TOML files from disk and checks defaults, overrides and validation.

use std::io::Write;
use std::path::Path;

use connection_pilot::config::{ConfigError, PilotConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn empty_file_gives_defaults() {
    let file = write_config("");
    let config = PilotConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config, PilotConfig::default());
}

#[test]
fn full_config_is_parsed() {
    let file = write_config(
        r#"
[pilot]
enabled = true
interval_secs = 1800

[site]
url = "https://blog.example.com"
multi_tenant = true
registered_at = "2026-10-19T08:00:00Z"

[classifier]
placeholder_suffixes = [".staging.example.net"]
new_tenant_grace_secs = 5400

[storage]
path = "/var/lib/connection-pilot"

[probe]
base_url = "http://127.0.0.1:9000"
api_token = "token"
timeout_secs = 10

[notify]
log = false
webhook_url = "https://alerts.example.com/hook"
"#,
    );

    let config = PilotConfig::load_from_file(file.path()).unwrap();

    assert_eq!(config.pilot.interval_secs, 1800);
    assert_eq!(config.run_interval().as_secs(), 1800);
    assert!(config.site.multi_tenant);
    assert!(config.tenant_metadata().registered_at.is_some());
    assert_eq!(config.storage.path, Path::new("/var/lib/connection-pilot"));
    assert_eq!(config.probe.api_token.as_deref(), Some("token"));
    assert!(!config.notify.log);

    let policy = config.evaluation_policy();
    assert_eq!(policy.placeholder_suffixes, vec![".staging.example.net".to_string()]);
    assert_eq!(policy.new_tenant_grace.num_seconds(), 5400);
}

#[test]
fn partial_section_keeps_other_defaults() {
    let file = write_config(
        r#"
[probe]
timeout_secs = 5
"#,
    );

    let config = PilotConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.probe.timeout_secs, 5);
    assert_eq!(config.probe.base_url, PilotConfig::default().probe.base_url);
    assert_eq!(config.pilot.interval_secs, 3600);
}

#[test]
fn invalid_values_fail_validation() {
    let file = write_config(
        r#"
[pilot]
interval_secs = 7200

[classifier]
new_tenant_grace_secs = 3600
"#,
    );

    let err = PilotConfig::load_from_file(file.path()).unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("new_tenant_grace_secs"));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn malformed_toml_is_parse_error() {
    let file = write_config("[pilot\ninterval_secs = ");
    assert!(matches!(
        PilotConfig::load_from_file(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn missing_explicit_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        PilotConfig::load(Some(&missing)),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn config_roundtrips_through_toml() {
    let mut config = PilotConfig::default();
    config.notify.webhook_url = Some("https://alerts.example.com/hook".to_string());

    let text = config.to_toml().unwrap();
    let file = write_config(&text);
    assert_eq!(PilotConfig::load_from_file(file.path()).unwrap(), config);
}
