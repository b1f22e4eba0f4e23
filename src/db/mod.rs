//! Remote engine abstraction for the Calcite CLI.
//!
//! Provides a trait-based interface over the query engine so the session
//! loop and executor never see the wire protocol.

pub mod avatica;
mod mock;
mod types;

pub use avatica::{AvaticaConnection, AvaticaCursor};
pub use mock::{MockConnection, MockRow, MockStats};
pub use types::{ExecutionReport, ResultSet, Row, Value};

use crate::connection::ConnectionDescriptor;
use crate::error::{CliError, Result, RowDecodeError};
use async_trait::async_trait;

/// Wire serializations understood by Avatica servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Serialization {
    #[default]
    Json,
    Protobuf,
}

impl Serialization {
    /// Returns the serialization as it appears in a descriptor.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Protobuf => "protobuf",
        }
    }

    /// Parses a serialization name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "protobuf" => Some(Self::Protobuf),
            _ => None,
        }
    }

    /// Returns true if this client can speak the serialization.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Opens a connection to the engine named by a validated descriptor.
///
/// This is the central factory function for engine connections.
pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Box<dyn Connection>> {
    let serialization = match descriptor.serialization.as_deref() {
        None => Serialization::default(),
        Some(name) => Serialization::parse(name).ok_or_else(|| {
            CliError::connection(format!("Unknown serialization '{name}'"))
        })?,
    };
    if !serialization.is_supported() {
        return Err(CliError::connection(format!(
            "Serialization '{}' is not supported by this client; use '{}'",
            serialization.as_str(),
            Serialization::Json.as_str()
        )));
    }

    let connection = AvaticaConnection::open(descriptor).await?;
    Ok(Box::new(connection))
}

/// Outcome of pulling one row off a cursor.
pub type RowResult = std::result::Result<Row, RowDecodeError>;

/// An open connection to the remote engine.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Dispatches one statement and returns a cursor over its result.
    async fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>>;

    /// Closes the connection.
    async fn close(&self) -> Result<()>;
}

/// Server-side result handle for one statement.
///
/// Owners must call [`RowCursor::close`] once they are done, whether or not
/// the rows were fully consumed.
#[async_trait]
pub trait RowCursor: Send {
    /// Column names, available before any row is read.
    fn columns(&self) -> &[String];

    /// Returns the next row, `Ok(None)` once exhausted.
    ///
    /// The inner error marks a single undecodable row; the outer error means
    /// the stream itself failed and no further rows will arrive.
    async fn next_row(&mut self) -> Result<Option<RowResult>>;

    /// Releases the server-side statement.
    async fn close(self: Box<Self>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_parse() {
        assert_eq!(Serialization::parse("json"), Some(Serialization::Json));
        assert_eq!(Serialization::parse("PROTOBUF"), Some(Serialization::Protobuf));
        assert_eq!(Serialization::parse("xml"), None);
        assert!(Serialization::Json.is_supported());
        assert!(!Serialization::Protobuf.is_supported());
    }

    fn descriptor(serialization: &str) -> ConnectionDescriptor {
        ConnectionDescriptor {
            base_url: "http://localhost:1".to_string(),
            serialization: Some(serialization.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_protobuf() {
        let err = connect(&descriptor("protobuf"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.category(), "Connection Error");
        assert!(err.to_string().contains("'protobuf' is not supported"));
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_serialization() {
        let err = connect(&descriptor("xml"))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unknown serialization 'xml'"));
    }
}
