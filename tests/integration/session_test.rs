//! End-to-end session tests.
//!
//! Drives the session loop with a scripted line source against the mock engine.

use calcite_cli::db::{MockConnection, MockRow, Value};
use calcite_cli::repl::{ScriptedLineSource, Session, SessionEnd, CONTINUATION_PROMPT, PRIMARY_PROMPT};

struct Transcript {
    end: SessionEnd,
    out: String,
    err: String,
}

async fn run(conn: &MockConnection, source: &mut ScriptedLineSource) -> Transcript {
    let mut session = Session::new(conn, Vec::new(), Vec::new());
    let end = session.run(source).await.unwrap();
    let (out, err) = session.into_writers();
    Transcript {
        end,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

fn emps() -> MockConnection {
    MockConnection::new().with_result(
        "SELECT empno, name, mgr FROM emps ORDER BY empno",
        &["empno", "name", "mgr"],
        vec![
            vec![Value::Int(100), Value::from("Fred"), Value::Null].into(),
            vec![Value::Int(110), Value::from("Eric"), Value::Int(100)].into(),
            vec![Value::Int(120), Value::from("Wilma"), Value::Int(100)].into(),
        ],
    )
}

#[tokio::test]
async fn test_multi_line_query_renders_table() {
    let conn = emps();
    let mut source = ScriptedLineSource::from_lines(&[
        "SELECT empno, name, mgr",
        "FROM emps",
        "ORDER BY empno;",
        "exit",
    ]);

    let transcript = run(&conn, &mut source).await;

    assert_eq!(transcript.end, SessionEnd::Exit);
    assert!(transcript.err.is_empty());

    let out = &transcript.out;
    let header = out.lines().find(|l| l.contains("empno")).unwrap();
    assert!(header.find("empno").unwrap() < header.find("name").unwrap());
    assert!(header.find("name").unwrap() < header.find("mgr").unwrap());
    assert!(out.find("Fred").unwrap() < out.find("Eric").unwrap());
    assert!(out.find("Eric").unwrap() < out.find("Wilma").unwrap());
    assert!(out.lines().any(|l| l.contains("Fred") && l.contains("NULL")));
    assert!(out.contains("Rows: 3\nExecution Time: "));
    assert!(out.ends_with("\n\n"));

    assert_eq!(
        source.prompts(),
        &[
            PRIMARY_PROMPT.to_string(),
            CONTINUATION_PROMPT.to_string(),
            CONTINUATION_PROMPT.to_string(),
            PRIMARY_PROMPT.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_statements_run_in_order() {
    let conn = MockConnection::new();
    let stats = conn.stats();
    let mut source =
        ScriptedLineSource::from_lines(&["SELECT 1;", "", "SELECT", "2;", ";", "SELECT 3;;"]);

    let transcript = run(&conn, &mut source).await;

    assert_eq!(transcript.end, SessionEnd::EndOfInput);
    assert_eq!(stats.executed(), vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    assert_eq!(stats.opened_cursors(), 3);
    assert_eq!(stats.released_cursors(), 3);
    assert_eq!(
        source.history(),
        &["SELECT 1;".to_string(), "SELECT 2;".to_string(), "SELECT 3;".to_string()]
    );
}

#[tokio::test]
async fn test_rejected_statement_does_not_end_session() {
    let conn = emps().with_error("SELECT * FROM missing", "Object 'MISSING' not found");
    let stats = conn.stats();
    let mut source = ScriptedLineSource::from_lines(&[
        "SELECT * FROM missing;",
        "SELECT empno, name, mgr FROM emps ORDER BY empno;",
        "quit",
    ]);

    let transcript = run(&conn, &mut source).await;

    assert_eq!(transcript.end, SessionEnd::Exit);
    assert!(transcript
        .err
        .contains("Error executing query: Query error: Object 'MISSING' not found"));
    assert!(transcript.out.contains("Rows: 3\n"));
    assert_eq!(stats.opened_cursors(), 1);
    assert_eq!(stats.released_cursors(), 1);
}

#[tokio::test]
async fn test_stream_failure_releases_cursor_and_continues() {
    let conn = MockConnection::new().with_stream_error(
        "SELECT * FROM big",
        &["id"],
        vec![vec![Value::Int(1)].into()],
        "Connection reset while fetching",
    );
    let stats = conn.stats();
    let mut source = ScriptedLineSource::from_lines(&["SELECT * FROM big;", "SELECT 2;"]);

    let transcript = run(&conn, &mut source).await;

    assert!(transcript.err.contains("Connection reset while fetching"));
    assert!(transcript.out.contains("Mock result for: SELECT 2"));
    assert_eq!(stats.released_cursors(), 2);
}

#[tokio::test]
async fn test_malformed_rows_are_skipped() {
    let conn = MockConnection::new().with_result(
        "SELECT id FROM t",
        &["id"],
        vec![
            vec![Value::Int(1)].into(),
            MockRow::Malformed("unexpected width".to_string()),
            vec![Value::Int(3)].into(),
        ],
    );
    let mut source = ScriptedLineSource::from_lines(&["SELECT id FROM t;"]);

    let transcript = run(&conn, &mut source).await;

    assert!(transcript.out.contains("Rows: 2\n"));
    assert!(transcript.out.contains("Skipped rows: 1"));
    assert!(transcript.err.is_empty());
}

#[tokio::test]
async fn test_exit_discards_pending_input() {
    let conn = MockConnection::new();
    let stats = conn.stats();
    let mut source = ScriptedLineSource::from_lines(&["SELECT *", "FROM emps", "Exit", "SELECT 1;"]);

    let transcript = run(&conn, &mut source).await;

    assert_eq!(transcript.end, SessionEnd::Exit);
    assert!(stats.executed().is_empty());
    assert!(transcript.out.is_empty());
    assert_eq!(source.remaining(), 1);
}

#[tokio::test]
async fn test_ddl_renders_summary_only() {
    let conn = MockConnection::new();
    let mut source = ScriptedLineSource::from_lines(&["CREATE TABLE t (id INT);"]);

    let transcript = run(&conn, &mut source).await;

    assert!(transcript.out.starts_with("Rows: 0\nExecution Time: "));
}
