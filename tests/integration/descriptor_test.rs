//! Descriptor assembly and connection opening tests.
//!
//! These never need a live server: they cover descriptor strings end-to-end
//! and the failures `db::connect` reports before or instead of a session.

use calcite_cli::config::ConnectionSettings;
use calcite_cli::connection::{build_descriptor, ConnectionDescriptor};
use calcite_cli::db;
use pretty_assertions::assert_eq;

fn settings(url: &str) -> ConnectionSettings {
    ConnectionSettings {
        url: Some(url.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_descriptor_matches_documented_format() {
    let settings = ConnectionSettings {
        serialization: Some("protobuf".to_string()),
        schema: Some("myschema".to_string()),
        user: Some("user1".to_string()),
        password: Some("pass1".to_string()),
        max_rows_total: Some(1000),
        ..settings("http://localhost:8080")
    };

    assert_eq!(
        build_descriptor(&settings).unwrap(),
        "http://localhost:8080/myschema?serialization=protobuf&avaticaUser=user1&avaticaPassword=pass1&maxRowsTotal=1000"
    );
}

#[test]
fn test_descriptor_survives_parse() {
    let settings = ConnectionSettings {
        serialization: Some("json".to_string()),
        schema: Some("/sales/".to_string()),
        user: Some("ann".to_string()),
        password: Some("p&ss word".to_string()),
        params: vec!["fun=oracle".to_string(), "caseSensitive=false".to_string()],
        enable_partition_pruning: Some(false),
        distributed_execution: Some(true),
        max_rows_total: Some(25),
        ..settings("http://localhost:8765")
    };

    let descriptor = ConnectionDescriptor::from_settings(&settings).unwrap();
    let parsed = ConnectionDescriptor::parse(&descriptor.to_string()).unwrap();

    assert_eq!(parsed, descriptor);
    assert_eq!(parsed.schema.as_deref(), Some("sales"));
    assert!(!descriptor.display_string().contains("p%26ss"));
}

#[test]
fn test_unpaired_credentials_fail_before_connecting() {
    let settings = ConnectionSettings {
        user: Some("ann".to_string()),
        ..settings("http://localhost:8080")
    };

    let err = build_descriptor(&settings).unwrap_err();
    assert_eq!(err.category(), "Configuration Error");
    assert!(err.is_fatal());
}

fn validated(settings: &ConnectionSettings) -> ConnectionDescriptor {
    ConnectionDescriptor::from_settings(settings).unwrap()
}

#[test]
fn test_protobuf_is_rejected_at_connect() {
    let descriptor = validated(&ConnectionSettings {
        serialization: Some("protobuf".to_string()),
        ..settings("http://127.0.0.1:1")
    });

    let result = tokio_test::block_on(db::connect(&descriptor));

    let err = result.err().unwrap();
    assert_eq!(err.category(), "Connection Error");
    assert!(err.to_string().contains("json"));
}

#[test]
fn test_unknown_serialization_is_rejected_at_connect() {
    let descriptor = validated(&ConnectionSettings {
        serialization: Some("xml".to_string()),
        ..settings("http://127.0.0.1:1")
    });

    let result = tokio_test::block_on(db::connect(&descriptor));

    let err = result.err().unwrap();
    assert!(err.to_string().contains("Unknown serialization 'xml'"));
}

#[tokio::test(flavor = "current_thread")]
async fn test_unreachable_server_is_connection_error() {
    let descriptor = validated(&settings("http://127.0.0.1:1"));

    let result = db::connect(&descriptor).await;

    let err = result.err().unwrap();
    assert_eq!(err.category(), "Connection Error");
    assert!(err.is_fatal());
}

#[tokio::test(flavor = "current_thread")]
async fn test_base_url_path_reaches_connection_intact() {
    let descriptor = validated(&settings("http://127.0.0.1:1/druid/v2/sql/avatica"));
    assert_eq!(descriptor.schema, None);

    let result = db::connect(&descriptor).await;

    // The connect error names the endpoint that was actually posted to.
    let err = result.err().unwrap();
    assert!(
        err.to_string().contains("http://127.0.0.1:1/druid/v2/sql/avatica/"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_schema_with_fragment_character_keeps_credentials() {
    let descriptor = validated(&ConnectionSettings {
        schema: Some("s#1".to_string()),
        user: Some("u".to_string()),
        password: Some("p".to_string()),
        ..settings("http://h:8080")
    });

    let parsed = ConnectionDescriptor::parse(&descriptor.to_string()).unwrap();

    assert_eq!(parsed.base_url, "http://h:8080");
    assert_eq!(parsed.schema.as_deref(), Some("s#1"));
    assert_eq!(parsed.credentials, descriptor.credentials);
}
