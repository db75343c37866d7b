//! Error types for Pathway

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Machine-readable error category, carried in tool error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Invalid,
    NotFound,
    AlreadyExists,
    CycleDetected,
    Inconsistent,
    IoFailure,
    ConfigInvalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::CycleDetected => "cycle_detected",
            Self::Inconsistent => "inconsistent",
            Self::IoFailure => "io_failure",
            Self::ConfigInvalid => "config_invalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cycle found under a single relationship, e.g. `a -> b -> a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CyclePath {
    pub relationship: String,
    /// Node IDs in traversal order; the first and last entries are equal.
    pub path: Vec<String>,
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.relationship, self.path.join(" -> "))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    Invalid(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("nodes not found: {}", .0.join(", "))]
    MissingNodes(Vec<String>),

    #[error("node '{source_id}' references missing node '{target}' via '{relationship}'")]
    UnresolvedEdge {
        source_id: String,
        relationship: String,
        target: String,
    },

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("cycle detected ({} path(s)): {}", .0.len(), join_cycles(.0))]
    CycleDetected(Vec<CyclePath>),

    #[error("inconsistent edges for relationship(s): {}", .0.join(", "))]
    Inconsistent(Vec<String>),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_cycles(cycles: &[CyclePath]) -> String {
    cycles
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::Invalid,
            Self::NotFound(_) | Self::MissingNodes(_) | Self::UnresolvedEdge { .. } => {
                ErrorKind::NotFound
            }
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::CycleDetected(_) => ErrorKind::CycleDetected,
            Self::Inconsistent(_) => ErrorKind::Inconsistent,
            Self::IoError(_) | Self::YamlError(_) | Self::JsonError(_) => ErrorKind::IoFailure,
            Self::ConfigError(_) => ErrorKind::ConfigInvalid,
        }
    }

    /// Cycle paths carried by a `CycleDetected` error, empty otherwise.
    pub fn cycles(&self) -> &[CyclePath] {
        match self {
            Self::CycleDetected(cycles) => cycles,
            _ => &[],
        }
    }
}
