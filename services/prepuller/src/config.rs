//! Configuration for the prepuller.
//!
//! Everything is read once from the environment at startup. Fixed node paths
//! (static list, service-account namespace, runtime socket, binaries) carry
//! their production defaults and are only overridden in tests.

use crate::error::ConfigError;
use crate::runtime::RuntimeConfig;
use crate::selection::SelectionPolicy;
use crate::source::{SourceConfig, WorkloadKind};

/// Comma-separated namespace override; `*` means all namespaces.
pub const ENV_NAMESPACES: &str = "NAMESPACES";
/// Comma-separated image prefixes to skip.
pub const ENV_IGNORE: &str = "IGNORE";
/// Maximum number of images to pull.
pub const ENV_LIMIT: &str = "LIMIT";
/// Registry host fragment that needs `--auth` on the Lightweight backend.
pub const ENV_PRIVATE_REGISTRY: &str = "PRIVATE_REGISTRY";
/// Auth string passed with `--auth` for `PRIVATE_REGISTRY` images.
pub const ENV_PRIVATE_REGISTRY_AUTH: &str = "PRIVATE_REGISTRY_AUTH";
/// Workload kind to harvest (`pods` or `deployments`).
pub const ENV_DISCOVER: &str = "DISCOVER";

/// Prepuller configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Where images are discovered.
    pub source: SourceConfig,

    /// How the harvested list is filtered and capped.
    pub selection: SelectionPolicy,

    /// Runtime detection and command paths.
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.source.namespaces_override = lookup(ENV_NAMESPACES);
        if let Some(kind) = lookup(ENV_DISCOVER) {
            config.source.workload_kind = parse_workload_kind(&kind)?;
        }

        // Empty entries are dropped; an empty prefix would skip every image.
        if let Some(ignore) = lookup(ENV_IGNORE) {
            config.selection.ignore_prefixes = split_list(&ignore);
        }
        if let Some(limit) = lookup(ENV_LIMIT) {
            config.selection.limit = Some(parse_limit(&limit)?);
        }

        config.runtime.private_registry = lookup(ENV_PRIVATE_REGISTRY);
        config.runtime.private_registry_auth = lookup(ENV_PRIVATE_REGISTRY_AUTH);

        Ok(config)
    }
}

/// Split a comma-separated value, trimming entries and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_limit(value: &str) -> Result<usize, ConfigError> {
    value
        .parse::<usize>()
        .map_err(|source| ConfigError::InvalidLimit {
            value: value.to_string(),
            source,
        })
}

fn parse_workload_kind(value: &str) -> Result<WorkloadKind, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "pods" | "pod" => Ok(WorkloadKind::Pods),
        "deployments" | "deployment" => Ok(WorkloadKind::Deployments),
        _ => Err(ConfigError::InvalidWorkloadKind(value.to_string())),
    }
}
