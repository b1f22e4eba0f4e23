//! Live Avatica server tests.
//!
//! These tests require a running Avatica server exposing the usual Calcite
//! sample schemas. Set AVATICA_URL (e.g. http://localhost:8765) to run them.

use calcite_cli::config::ConnectionSettings;
use calcite_cli::connection::ConnectionDescriptor;
use calcite_cli::db::{self, Connection, Value};
use calcite_cli::query::{QueryExecutor, Statement};

/// Helper to get the server URL from environment.
fn get_test_server_url() -> Option<String> {
    std::env::var("AVATICA_URL").ok()
}

/// Helper to open a test connection.
async fn get_test_connection() -> Option<Box<dyn Connection>> {
    let url = get_test_server_url()?;
    let descriptor = ConnectionDescriptor::from_settings(&ConnectionSettings {
        url: Some(url),
        serialization: Some("json".to_string()),
        ..Default::default()
    })
    .ok()?;
    db::connect(&descriptor).await.ok()
}

fn statement(sql: &str) -> Statement {
    Statement::from_lines(&[sql]).unwrap()
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_and_close() {
    let Some(conn) = get_test_connection().await else {
        eprintln!("Skipping test: AVATICA_URL not set");
        return;
    };

    conn.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_values_query() {
    let Some(conn) = get_test_connection().await else {
        eprintln!("Skipping test: AVATICA_URL not set");
        return;
    };

    let executor = QueryExecutor::new(conn.as_ref());
    let (result, report) = executor
        .execute(&statement("VALUES (1, 'a'), (2, CAST(NULL AS VARCHAR(1)))"))
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 2);
    assert_eq!(report.row_count, 2);
    assert_eq!(result.rows[0][0], Value::Int(1));
    assert!(result.rows[1][1].is_null());

    conn.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_invalid_sql_is_query_error_and_connection_survives() {
    let Some(conn) = get_test_connection().await else {
        eprintln!("Skipping test: AVATICA_URL not set");
        return;
    };

    let executor = QueryExecutor::new(conn.as_ref());
    let err = executor
        .execute(&statement("SELEC nonsense"))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "Query Error");

    let (_, report) = executor.execute(&statement("VALUES 1")).await.unwrap();
    assert_eq!(report.row_count, 1);

    conn.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_result_larger_than_one_frame() {
    let Some(conn) = get_test_connection().await else {
        eprintln!("Skipping test: AVATICA_URL not set");
        return;
    };

    let executor = QueryExecutor::new(conn.as_ref());
    let values = (0..250)
        .map(|i| format!("({i})"))
        .collect::<Vec<_>>()
        .join(", ");
    let (result, report) = executor
        .execute(&statement(&format!("VALUES {values}")))
        .await
        .unwrap();

    assert_eq!(report.row_count, 250);
    assert_eq!(result.rows.last().unwrap()[0], Value::Int(249));

    conn.close().await.unwrap();
}
