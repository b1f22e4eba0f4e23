//! Settings resolution tests.
//!
//! Config file, named profiles, CLI flags, and environment layered together.

use calcite_cli::cli::Cli;
use calcite_cli::config::{Config, ConnectionSettings};
use calcite_cli::connection::{build_descriptor, resolve_settings};
use clap::Parser;
use pretty_assertions::assert_eq;
use std::io::Write;

fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    (dir, path)
}

const CONFIG: &str = r#"
[repl]
history_size = 50

[connections.default]
url = "http://default:8765"

[connections.analytics]
url = "http://analytics:8765"
schema = "warehouse"
user = "reader"
password = "secret"
params = ["fun=oracle"]
max_rows_total = 5000
"#;

#[test]
fn test_profile_with_cli_override() {
    let (_dir, path) = write_config(CONFIG);
    let config = Config::load_from_file(&path).unwrap();
    let cli = Cli::parse_from([
        "calcite",
        "-c",
        "analytics",
        "--schema",
        "staging",
        "--maxRowsTotal",
        "10",
    ]);

    let settings =
        resolve_settings(&cli.to_connection_settings(), cli.connection_name(), &config).unwrap();

    assert_eq!(
        build_descriptor(&settings).unwrap(),
        "http://analytics:8765/staging?serialization=json&avaticaUser=reader&avaticaPassword=secret&fun=oracle&maxRowsTotal=10"
    );
    assert_eq!(config.repl.history_size, 50);
}

#[test]
fn test_default_profile_without_flags() {
    let (_dir, path) = write_config(CONFIG);
    let config = Config::load_from_file(&path).unwrap();

    let settings = resolve_settings(&ConnectionSettings::default(), None, &config).unwrap();

    assert_eq!(settings.url.as_deref(), Some("http://default:8765"));
}

#[test]
fn test_missing_config_file_uses_builtin_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(&dir.path().join("absent.toml")).unwrap();

    let mut settings = config.get_connection(None).cloned().unwrap_or_default();
    settings.apply_env_defaults_from(|_| None);
    settings.apply_builtin_defaults();

    assert_eq!(
        build_descriptor(&settings).unwrap(),
        "http://localhost:8080?serialization=json"
    );
}

#[test]
fn test_environment_fills_gaps_only() {
    let mut settings = ConnectionSettings {
        url: Some("http://cli:8765".to_string()),
        ..Default::default()
    };

    settings.apply_env_defaults_from(|key| match key {
        "CALCITE_URL" => Some("http://env:8765".to_string()),
        "CALCITE_USER" => Some("env-user".to_string()),
        "CALCITE_PASSWORD" => Some("env-pass".to_string()),
        _ => None,
    });

    assert_eq!(settings.url.as_deref(), Some("http://cli:8765"));
    assert_eq!(settings.user.as_deref(), Some("env-user"));
    assert_eq!(settings.password.as_deref(), Some("env-pass"));
}

#[test]
fn test_invalid_config_is_configuration_error() {
    let (_dir, path) = write_config("[connections.default]\nurl = 42\n");
    let err = Config::load_from_file(&path).unwrap_err();
    assert_eq!(err.category(), "Configuration Error");
}
