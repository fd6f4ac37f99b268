//! Error types for the prepuller.
//!
//! Only configuration problems are errors in the `Result` sense. Per-namespace
//! discovery failures, credential-helper failures and per-image pull failures
//! are logged where they happen and never reach these types.

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Errors parsing the environment into a [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `LIMIT` is not a non-negative integer.
    #[error("invalid_limit: LIMIT={value:?} is not a non-negative integer: {source}")]
    InvalidLimit {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// `DISCOVER` names an unknown workload kind.
    #[error("invalid_workload_kind: {0:?} (expected 'pods' or 'deployments')")]
    InvalidWorkloadKind(String),
}

impl ConfigError {
    /// Get the standardized reason code for this error.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ConfigError::InvalidLimit { .. } => "invalid_limit",
            ConfigError::InvalidWorkloadKind(_) => "invalid_workload_kind",
        }
    }
}

/// Fatal errors that end a prepull run before the pull phase.
#[derive(Debug, Error)]
pub enum PrepullError {
    /// Configuration could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The static image list exists but could not be read.
    #[error("static_list_unreadable: {path}: {source}")]
    StaticListUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `NAMESPACES` was set but held no namespace names.
    #[error("namespaces_empty: specify one or more namespaces (comma-separated) in NAMESPACES, or '*' for all namespaces")]
    NamespacesEmpty,

    /// No override and the service-account namespace file is unusable.
    #[error("namespace_unresolved: {path}: {detail}")]
    NamespaceUnresolved { path: PathBuf, detail: String },

    /// The cluster API client could not be created.
    #[error("cluster_unavailable: {0}")]
    ClusterUnavailable(String),
}

impl PrepullError {
    /// Get the standardized reason code for this error.
    pub fn reason_code(&self) -> &'static str {
        match self {
            PrepullError::Config(e) => e.reason_code(),
            PrepullError::StaticListUnreadable { .. } => "static_list_unreadable",
            PrepullError::NamespacesEmpty => "namespaces_empty",
            PrepullError::NamespaceUnresolved { .. } => "namespace_unresolved",
            PrepullError::ClusterUnavailable(_) => "cluster_unavailable",
        }
    }
}
