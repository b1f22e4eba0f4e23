//! Avatica connection over HTTP with JSON serialization.
//!
//! Every RPC is a single `POST` of a JSON request object to the server
//! endpoint. A statement's rows arrive in frames: the first frame rides on the
//! execute response and later ones are pulled with `fetch` until a frame is
//! marked `done`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Connection, Row, RowCursor, RowResult, Value};
use crate::connection::{ConnectionDescriptor, Credentials};
use crate::error::{CliError, Result, RowDecodeError};

/// Default timeout for a single RPC.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Rows requested per frame.
const FETCH_FRAME_SIZE: i32 = 100;

/// Failure of a single RPC, before it is classified for the caller.
#[derive(Error, Debug)]
enum RpcError {
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Server(String),
}

impl RpcError {
    fn into_connection_error(self) -> CliError {
        CliError::connection(self.to_string())
    }

    fn into_query_error(self) -> CliError {
        CliError::query(self.to_string())
    }
}

#[derive(Serialize, Debug)]
#[serde(tag = "request", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum Request<'a> {
    OpenConnection {
        connection_id: &'a str,
        info: &'a BTreeMap<String, String>,
    },
    ConnectionSync {
        connection_id: &'a str,
        conn_props: ConnProps<'a>,
    },
    CreateStatement {
        connection_id: &'a str,
    },
    PrepareAndExecute {
        connection_id: &'a str,
        statement_id: u32,
        sql: &'a str,
        max_rows_total: i64,
        max_rows_in_first_frame: i32,
    },
    Fetch {
        connection_id: &'a str,
        statement_id: u32,
        offset: u64,
        fetch_max_row_count: i32,
    },
    CloseStatement {
        connection_id: &'a str,
        statement_id: u32,
    },
    CloseConnection {
        connection_id: &'a str,
    },
}

#[derive(Serialize, Debug)]
struct ConnProps<'a> {
    #[serde(rename = "connProps")]
    kind: &'static str,
    schema: &'a str,
    dirty: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    exceptions: Vec<String>,
    #[serde(default)]
    sql_state: Option<String>,
}

impl ErrorResponse {
    fn message(&self) -> String {
        let message = self
            .error_message
            .clone()
            .or_else(|| self.exceptions.first().and_then(|e| e.lines().next()).map(String::from))
            .unwrap_or_else(|| "Unknown server error".to_string());

        match &self.sql_state {
            Some(state) if !state.is_empty() && state != "00000" => {
                format!("{message} (SQLSTATE {state})")
            }
            _ => message,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateStatementResponse {
    statement_id: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ExecuteResponse {
    #[serde(default)]
    results: Vec<ResultSetResponse>,
    #[serde(default)]
    missing_statement: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResultSetResponse {
    #[serde(default)]
    signature: Option<Signature>,
    #[serde(default)]
    first_frame: Option<Frame>,
}

#[derive(Deserialize, Debug)]
struct Signature {
    #[serde(default)]
    columns: Vec<ColumnMetaData>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ColumnMetaData {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    column_name: Option<String>,
}

impl ColumnMetaData {
    fn name(&self) -> String {
        self.label
            .clone()
            .filter(|label| !label.is_empty())
            .or_else(|| self.column_name.clone())
            .unwrap_or_default()
    }
}

#[derive(Deserialize, Debug, Default)]
struct Frame {
    #[serde(default)]
    offset: u64,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    rows: Vec<JsonValue>,
}

#[derive(Deserialize, Debug)]
struct FetchResponse {
    frame: Frame,
}

/// Shared HTTP plumbing for one connection and its cursors.
#[derive(Debug)]
struct Transport {
    client: Client,
    endpoint: String,
    credentials: Option<Credentials>,
    connection_id: String,
}

impl Transport {
    async fn call<T: DeserializeOwned>(&self, request: &Request<'_>) -> std::result::Result<T, RpcError> {
        debug!(?request, "Avatica request");

        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Transport("Request timed out".to_string())
            } else if e.is_connect() {
                RpcError::Transport(format!(
                    "Failed to connect to {}. Is the Avatica server running?",
                    self.endpoint
                ))
            } else {
                RpcError::Transport(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RpcError::Transport(format!("Failed to read response: {e}")))?;

        decode_response(status.is_success(), status.as_u16(), &body)
    }

    async fn close_statement(&self, statement_id: u32) -> std::result::Result<(), RpcError> {
        let _: JsonValue = self
            .call(&Request::CloseStatement {
                connection_id: &self.connection_id,
                statement_id,
            })
            .await?;
        Ok(())
    }
}

/// Interprets a response body, surfacing Avatica error responses.
fn decode_response<T: DeserializeOwned>(
    success: bool,
    status: u16,
    body: &str,
) -> std::result::Result<T, RpcError> {
    let json: JsonValue = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) if !success => {
            return Err(RpcError::Transport(format!("Server returned HTTP {status}: {body}")))
        }
        Err(e) => return Err(RpcError::Transport(format!("Failed to parse response: {e}"))),
    };

    if json.get("response").and_then(JsonValue::as_str) == Some("error") {
        let error: ErrorResponse = serde_json::from_value(json)
            .map_err(|e| RpcError::Transport(format!("Failed to parse error response: {e}")))?;
        return Err(RpcError::Server(error.message()));
    }
    if !success {
        return Err(RpcError::Transport(format!("Server returned HTTP {status}: {body}")));
    }

    serde_json::from_value(json)
        .map_err(|e| RpcError::Transport(format!("Unexpected response shape: {e}")))
}

/// An open Avatica connection.
#[derive(Debug)]
pub struct AvaticaConnection {
    transport: Arc<Transport>,
    max_rows_total: i64,
}

impl AvaticaConnection {
    /// Opens a connection and applies the descriptor's schema.
    pub async fn open(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| CliError::connection(format!("Failed to create HTTP client: {e}")))?;

        let transport = Arc::new(Transport {
            client,
            // Trailing slash so a base URL with a path is posted to as-is
            endpoint: format!("{}/", descriptor.base_url),
            credentials: descriptor.credentials.clone(),
            connection_id: uuid::Uuid::new_v4().to_string(),
        });

        let info = connection_info(descriptor);
        let _: JsonValue = transport
            .call(&Request::OpenConnection {
                connection_id: &transport.connection_id,
                info: &info,
            })
            .await
            .map_err(RpcError::into_connection_error)?;
        debug!(connection_id = %transport.connection_id, "Opened Avatica connection");

        if let Some(schema) = &descriptor.schema {
            let _: JsonValue = transport
                .call(&Request::ConnectionSync {
                    connection_id: &transport.connection_id,
                    conn_props: ConnProps {
                        kind: "connPropsImpl",
                        schema,
                        dirty: true,
                    },
                })
                .await
                .map_err(RpcError::into_connection_error)?;
        }

        // Avatica reads -1 as "no limit".
        let max_rows_total = descriptor
            .max_rows_total
            .and_then(|limit| i64::try_from(limit).ok())
            .unwrap_or(-1);

        Ok(Self {
            transport,
            max_rows_total,
        })
    }

    /// Returns the server-side connection id.
    pub fn connection_id(&self) -> &str {
        &self.transport.connection_id
    }

    async fn execute(&self, statement_id: u32, sql: &str) -> Result<AvaticaCursor> {
        let response: ExecuteResponse = self
            .transport
            .call(&Request::PrepareAndExecute {
                connection_id: &self.transport.connection_id,
                statement_id,
                sql,
                max_rows_total: self.max_rows_total,
                max_rows_in_first_frame: FETCH_FRAME_SIZE,
            })
            .await
            .map_err(RpcError::into_query_error)?;

        if response.missing_statement {
            return Err(CliError::query("Server lost the statement before execution"));
        }

        let result = response.results.into_iter().next();
        let (columns, frame) = match result {
            Some(result) => {
                let columns: Vec<String> = result
                    .signature
                    .map(|s| s.columns.iter().map(ColumnMetaData::name).collect())
                    .unwrap_or_default();
                (columns, result.first_frame)
            }
            None => (Vec::new(), None),
        };

        let mut cursor = AvaticaCursor {
            transport: Arc::clone(&self.transport),
            statement_id,
            columns,
            buffered: VecDeque::new(),
            next_offset: 0,
            done: true,
            position: 0,
            closed: false,
        };
        if let Some(frame) = frame {
            cursor.absorb(frame);
        }
        Ok(cursor)
    }
}

#[async_trait]
impl Connection for AvaticaConnection {
    async fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>> {
        let created: CreateStatementResponse = self
            .transport
            .call(&Request::CreateStatement {
                connection_id: &self.transport.connection_id,
            })
            .await
            .map_err(RpcError::into_query_error)?;

        match self.execute(created.statement_id, sql).await {
            Ok(cursor) => Ok(Box::new(cursor)),
            Err(e) => {
                // The statement was created, so it must be released even though
                // execution failed.
                if let Err(close_err) = self.transport.close_statement(created.statement_id).await {
                    warn!("Failed to close rejected statement: {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<()> {
        let _: JsonValue = self
            .transport
            .call(&Request::CloseConnection {
                connection_id: &self.transport.connection_id,
            })
            .await
            .map_err(RpcError::into_connection_error)?;
        debug!(connection_id = %self.transport.connection_id, "Closed Avatica connection");
        Ok(())
    }
}

/// Row cursor over one executed Avatica statement.
#[derive(Debug)]
pub struct AvaticaCursor {
    transport: Arc<Transport>,
    statement_id: u32,
    columns: Vec<String>,
    buffered: VecDeque<JsonValue>,
    next_offset: u64,
    done: bool,
    position: usize,
    closed: bool,
}

impl AvaticaCursor {
    fn absorb(&mut self, frame: Frame) {
        self.next_offset = frame.offset + frame.rows.len() as u64;
        self.done = frame.done;
        // An empty frame that is not done would make `next_row` fetch the
        // same offset forever.
        if frame.rows.is_empty() && !frame.done {
            warn!("Server sent an empty frame that is not marked done; ending result");
            self.done = true;
        }
        self.buffered.extend(frame.rows);
    }

    async fn fetch(&mut self) -> Result<()> {
        let response: FetchResponse = self
            .transport
            .call(&Request::Fetch {
                connection_id: &self.transport.connection_id,
                statement_id: self.statement_id,
                offset: self.next_offset,
                fetch_max_row_count: FETCH_FRAME_SIZE,
            })
            .await
            .map_err(RpcError::into_query_error)?;
        self.absorb(response.frame);
        Ok(())
    }
}

#[async_trait]
impl RowCursor for AvaticaCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<RowResult>> {
        loop {
            if let Some(raw) = self.buffered.pop_front() {
                let index = self.position;
                self.position += 1;
                return Ok(Some(decode_row(index, raw, &self.columns)));
            }
            if self.done {
                return Ok(None);
            }
            self.fetch().await?;
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut cursor = self;
        cursor.closed = true;
        cursor
            .transport
            .close_statement(cursor.statement_id)
            .await
            .map_err(RpcError::into_query_error)
    }
}

impl Drop for AvaticaCursor {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Dropped without `close` (e.g. a cancelled future). Release the
        // statement in the background; nothing can await here.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(statement_id = self.statement_id, "Statement dropped outside a runtime; not closed");
            return;
        };
        let transport = Arc::clone(&self.transport);
        let statement_id = self.statement_id;
        handle.spawn(async move {
            if let Err(e) = transport.close_statement(statement_id).await {
                warn!(statement_id, "Failed to close dropped statement: {}", e);
            }
        });
    }
}

/// Properties sent with `openConnection`.
fn connection_info(descriptor: &ConnectionDescriptor) -> BTreeMap<String, String> {
    let mut info: BTreeMap<String, String> = descriptor.params.iter().cloned().collect();
    if let Some(enabled) = descriptor.enable_partition_pruning {
        info.insert("enablePartitionPruning".to_string(), enabled.to_string());
    }
    if let Some(enabled) = descriptor.distributed_execution {
        info.insert("distributedExecution".to_string(), enabled.to_string());
    }
    info
}

/// Decodes one frame row against the statement's columns.
///
/// Rows arrive either as positional arrays or as objects keyed by column name.
fn decode_row(index: usize, raw: JsonValue, columns: &[String]) -> RowResult {
    let cells = match raw {
        JsonValue::Array(cells) => cells,
        JsonValue::Object(mut fields) => columns
            .iter()
            .map(|column| fields.remove(column).unwrap_or(JsonValue::Null))
            .collect(),
        other => {
            return Err(RowDecodeError::new(
                index,
                format!("expected an array or object, got {other}"),
            ))
        }
    };

    if cells.len() != columns.len() {
        return Err(RowDecodeError::new(
            index,
            format!("expected {} cells, got {}", columns.len(), cells.len()),
        ));
    }

    Ok(cells.into_iter().map(decode_cell).collect::<Row>())
}

fn decode_cell(cell: JsonValue) -> Value {
    match cell {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        JsonValue::String(s) => Value::String(s),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::String(nested.to_string()),
    }
}
