// src/error.rs

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::raw::json_type;
use crate::table::{Dimension, TableKind};

/// Top-level failure of a snapshot: fetch, unwrap or reshape.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("GET {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unwrapping payload: {0}")]
    Unwrap(#[from] UnwrapError),
    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedInput),
}

/// The body could not be turned into a `RawTree`.
#[derive(Debug, Error)]
pub enum UnwrapError {
    #[error("invalid JSON in {stage}: {source}")]
    Json {
        stage: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("envelope has no `data` field")]
    MissingData,
    #[error("envelope `data` is neither a string nor an object (got {0})")]
    InvalidData(&'static str),
}

/// Structurally required input is absent or of the wrong JSON type, or two
/// nodes collapse to one key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedInput {
    #[error("{table} table: required `{missing}` is missing")]
    Missing { table: TableKind, missing: String },
    #[error("{table} table: duplicate row key {key}")]
    DuplicateKey { table: TableKind, key: String },
    #[error("{table} table: `{path}` should be {expected}, found {found}")]
    Invalid {
        table: TableKind,
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl MalformedInput {
    pub fn missing(table: TableKind, missing: impl Into<String>) -> Self {
        MalformedInput::Missing {
            table,
            missing: missing.into(),
        }
    }

    pub fn invalid(
        table: TableKind,
        path: impl Into<String>,
        expected: &'static str,
        found: &Value,
    ) -> Self {
        MalformedInput::Invalid {
            table,
            path: path.into(),
            expected,
            found: json_type(found),
        }
    }
}

/// A row skipped because its node carries no record for the dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Omission {
    pub table: TableKind,
    pub region: String,
    pub city: Option<String>,
    pub dimension: Dimension,
    /// Raw field that was absent, e.g. `total`.
    pub missing: &'static str,
}

impl std::fmt::Display for Omission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.city {
            Some(city) => write!(
                f,
                "{}: {}/{} has no `{}` ({} row omitted)",
                self.table, self.region, city, self.missing, self.dimension
            ),
            None => write!(
                f,
                "{}: {} has no `{}` ({} row omitted)",
                self.table, self.region, self.missing, self.dimension
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid endpoint `{endpoint}`: {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid value `{value}` for {var}")]
    Env { var: &'static str, value: String },
}
