//! Connection descriptor assembly.
//!
//! Turns layered [`ConnectionSettings`] into the single URL-shaped descriptor
//! used to open an Avatica connection:
//!
//! ```text
//! <base>[/<schema>][?serialization=..&avaticaUser=..&avaticaPassword=..&<extra>..
//!                    &enablePartitionPruning=..&distributedExecution=..&maxRowsTotal=..]
//! ```
//!
//! Parameters always appear in that order and unset settings are omitted.

use std::fmt;

use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::config::ConnectionSettings;
use crate::error::{CliError, Result};

pub const PARAM_SERIALIZATION: &str = "serialization";
pub const PARAM_USER: &str = "avaticaUser";
pub const PARAM_PASSWORD: &str = "avaticaPassword";
pub const PARAM_PARTITION_PRUNING: &str = "enablePartitionPruning";
pub const PARAM_DISTRIBUTED_EXECUTION: &str = "distributedExecution";
pub const PARAM_MAX_ROWS_TOTAL: &str = "maxRowsTotal";

const RESERVED_PARAMS: &[&str] = &[
    PARAM_SERIALIZATION,
    PARAM_USER,
    PARAM_PASSWORD,
    PARAM_PARTITION_PRUNING,
    PARAM_DISTRIBUTED_EXECUTION,
    PARAM_MAX_ROWS_TOTAL,
];

/// Avatica credentials. Only constructible as a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// A validated connection descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Server address without schema or query section, no trailing slash.
    pub base_url: String,
    pub serialization: Option<String>,
    pub schema: Option<String>,
    pub credentials: Option<Credentials>,
    /// Extra `key=value` parameters in the order they were given.
    pub params: Vec<(String, String)>,
    pub enable_partition_pruning: Option<bool>,
    pub distributed_execution: Option<bool>,
    pub max_rows_total: Option<u64>,
}

/// Builds the descriptor string for the given settings.
pub fn build_descriptor(settings: &ConnectionSettings) -> Result<String> {
    Ok(ConnectionDescriptor::from_settings(settings)?.to_string())
}

impl ConnectionDescriptor {
    /// Validates settings and assembles a descriptor.
    ///
    /// Fails when the base URL is missing or malformed, when only one of
    /// user/password is set, or when an extra parameter is not `key=value`.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self> {
        let base_url = non_empty(&settings.url)
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| CliError::config("A base URL is required"))?;
        validate_base_url(&base_url)?;

        let schema = non_empty(&settings.schema)
            .map(|schema| schema.trim_matches('/').to_string())
            .filter(|schema| !schema.is_empty());

        let credentials = pair_credentials(non_empty(&settings.user), non_empty(&settings.password))?;

        let mut params = Vec::with_capacity(settings.params.len());
        for raw in &settings.params {
            if let Some(pair) = parse_param(raw)? {
                params.push(pair);
            }
        }

        Ok(Self {
            base_url,
            serialization: non_empty(&settings.serialization),
            schema,
            credentials,
            params,
            enable_partition_pruning: settings.enable_partition_pruning,
            distributed_execution: settings.distributed_execution,
            max_rows_total: settings.max_rows_total,
        })
    }

    /// Parses a descriptor string back into its parts.
    ///
    /// The last path segment, if any, is taken as the schema, so a base URL
    /// that carries its own path does not survive a round trip. Connections
    /// are opened from the validated descriptor, never from a parsed string.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut url = Url::parse(descriptor)
            .map_err(|e| CliError::config(format!("Invalid descriptor '{descriptor}': {e}")))?;

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        url.set_query(None);

        let schema = match url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
        {
            Some(segment) => Some(
                urlencoding::decode(segment)
                    .map_err(|e| CliError::config(format!("Invalid schema '{segment}': {e}")))?
                    .into_owned(),
            ),
            None => None,
        };
        if schema.is_some() {
            url.path_segments_mut()
                .map_err(|_| CliError::config(format!("Invalid descriptor '{descriptor}'")))?
                .pop();
        }

        let mut result = Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            schema,
            ..Default::default()
        };

        let mut user = None;
        let mut password = None;
        for (key, value) in pairs {
            match key.as_str() {
                PARAM_SERIALIZATION => result.serialization = Some(value),
                PARAM_USER => user = Some(value),
                PARAM_PASSWORD => password = Some(value),
                PARAM_PARTITION_PRUNING => {
                    result.enable_partition_pruning = Some(parse_bool(&key, &value)?)
                }
                PARAM_DISTRIBUTED_EXECUTION => {
                    result.distributed_execution = Some(parse_bool(&key, &value)?)
                }
                PARAM_MAX_ROWS_TOTAL => {
                    let limit = value.parse().map_err(|_| {
                        CliError::config(format!("Invalid {key} '{value}': expected a number"))
                    })?;
                    result.max_rows_total = Some(limit);
                }
                _ => result.params.push((key, value)),
            }
        }
        result.credentials = pair_credentials(user, password)?;

        Ok(result)
    }

    /// Query parameters in their fixed rendering order.
    pub fn query_pairs(&self) -> Vec<(&str, String)> {
        let mut pairs = Vec::new();

        if let Some(serialization) = &self.serialization {
            pairs.push((PARAM_SERIALIZATION, serialization.clone()));
        }
        if let Some(credentials) = &self.credentials {
            pairs.push((PARAM_USER, credentials.user.clone()));
            pairs.push((PARAM_PASSWORD, credentials.password.clone()));
        }
        for (key, value) in &self.params {
            pairs.push((key.as_str(), value.clone()));
        }
        if let Some(enabled) = self.enable_partition_pruning {
            pairs.push((PARAM_PARTITION_PRUNING, enabled.to_string()));
        }
        if let Some(enabled) = self.distributed_execution {
            pairs.push((PARAM_DISTRIBUTED_EXECUTION, enabled.to_string()));
        }
        if let Some(limit) = self.max_rows_total {
            pairs.push((PARAM_MAX_ROWS_TOTAL, limit.to_string()));
        }

        pairs
    }

    /// Returns a display-safe descriptor (password masked) for logs and banners.
    pub fn display_string(&self) -> String {
        self.render(true)
    }

    fn render(&self, mask_password: bool) -> String {
        let mut out = self.base_url.clone();

        // Encoded as one path segment: `#`, `?` and `/` in a schema must not
        // end the path early.
        if let Some(schema) = &self.schema {
            out.push('/');
            out.push_str(&urlencoding::encode(schema));
        }

        let query = self
            .query_pairs()
            .into_iter()
            .map(|(key, value)| {
                let value = if mask_password && key == PARAM_PASSWORD {
                    "****".to_string()
                } else {
                    encode(&value)
                };
                format!("{}={}", encode(key), value)
            })
            .collect::<Vec<_>>()
            .join("&");

        if !query.is_empty() {
            out.push('?');
            out.push_str(&query);
        }

        out
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn encode(component: &str) -> String {
    byte_serialize(component.as_bytes()).collect()
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let url = Url::parse(base_url)
        .map_err(|e| CliError::config(format!("Invalid base URL '{base_url}': {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CliError::config(format!(
            "Invalid scheme '{}'. Expected 'http' or 'https'",
            url.scheme()
        )));
    }
    if url.query().is_some() {
        return Err(CliError::config(format!(
            "Base URL '{base_url}' must not contain query parameters; use --connectionParams"
        )));
    }

    Ok(())
}

fn pair_credentials(user: Option<String>, password: Option<String>) -> Result<Option<Credentials>> {
    match (user, password) {
        (Some(user), Some(password)) => Ok(Some(Credentials { user, password })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(CliError::config(
            "A user was given without a password; both must be set together",
        )),
        (None, Some(_)) => Err(CliError::config(
            "A password was given without a user; both must be set together",
        )),
    }
}

/// Parses one extra parameter. Pairs with an empty value are dropped.
fn parse_param(raw: &str) -> Result<Option<(String, String)>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let (key, value) = raw.split_once('=').ok_or_else(|| {
        CliError::config(format!(
            "Invalid connection parameter '{raw}': expected key=value"
        ))
    })?;
    let (key, value) = (key.trim(), value.trim());

    if key.is_empty() {
        return Err(CliError::config(format!(
            "Invalid connection parameter '{raw}': empty key"
        )));
    }
    if RESERVED_PARAMS.contains(&key) {
        return Err(CliError::config(format!(
            "Connection parameter '{key}' has a dedicated setting and cannot be passed as an extra parameter"
        )));
    }
    if value.is_empty() {
        return Ok(None);
    }

    Ok(Some((key.to_string(), value.to_string())))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .map_err(|_| CliError::config(format!("Invalid {key} '{value}': expected true or false")))
}
