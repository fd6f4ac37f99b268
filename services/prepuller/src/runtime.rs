//! Container runtime backend selection.
//!
//! The node runs either the standard runtime (pulled through its CLI, with a
//! credential helper for the hosted registry) or a lightweight CRI runtime
//! pulled through its CRI client, which can pass per-image `--auth`.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::command::CommandSpec;
use crate::image::ImageReference;

/// Paths and settings used to pick and drive the backend.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Control socket whose presence selects the Lightweight backend.
    pub lightweight_socket: PathBuf,

    /// Standard runtime CLI.
    pub standard_binary: PathBuf,

    /// Lightweight runtime CRI client.
    pub lightweight_binary: PathBuf,

    /// Credential helper run once before the first hosted-registry image.
    pub credential_helper: PathBuf,

    /// Arguments for the credential helper.
    pub credential_helper_args: Vec<String>,

    /// Substring identifying hosted-registry images.
    pub hosted_registry_fragment: String,

    /// Private registry host fragment (Lightweight only).
    pub private_registry: Option<String>,

    /// Auth string for the private registry (Lightweight only).
    pub private_registry_auth: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            lightweight_socket: PathBuf::from("/run/crio/crio.sock"),
            standard_binary: PathBuf::from("/bin/docker"),
            lightweight_binary: PathBuf::from("/bin/crictl"),
            credential_helper: PathBuf::from("/bin/docker-credential-gcr"),
            credential_helper_args: vec!["configure-docker".to_string()],
            hosted_registry_fragment: "gcr.io".to_string(),
            private_registry: None,
            private_registry_auth: None,
        }
    }
}

/// One-time credential setup for hosted-registry images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHelper {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Images containing this fragment need the helper.
    pub registry_fragment: String,
}

impl CredentialHelper {
    pub fn command(&self) -> CommandSpec {
        self.args
            .iter()
            .fold(CommandSpec::new(&self.program), |cmd, arg| cmd.arg(arg))
    }
}

/// Per-image auth for a private registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    /// Images containing this fragment get `--auth`.
    pub registry: String,
    pub auth: String,
}

/// The runtime client used for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeBackend {
    Standard {
        binary: PathBuf,
        credential_helper: CredentialHelper,
    },
    Lightweight {
        binary: PathBuf,
        registry_auth: Option<RegistryAuth>,
    },
}

impl RuntimeBackend {
    /// Pick the backend from the node's filesystem.
    pub fn detect(config: &RuntimeConfig) -> Self {
        if !socket_present(&config.lightweight_socket) {
            info!(
                binary = %config.standard_binary.display(),
                "Using standard runtime"
            );
            return Self::standard(config);
        }

        info!(
            socket = %config.lightweight_socket.display(),
            binary = %config.lightweight_binary.display(),
            "Found lightweight runtime socket"
        );
        Self::lightweight(config)
    }

    /// Standard backend from `config`, regardless of what is on disk.
    pub fn standard(config: &RuntimeConfig) -> Self {
        Self::Standard {
            binary: config.standard_binary.clone(),
            credential_helper: CredentialHelper {
                program: config.credential_helper.clone(),
                args: config.credential_helper_args.clone(),
                registry_fragment: config.hosted_registry_fragment.clone(),
            },
        }
    }

    /// Lightweight backend from `config`, regardless of what is on disk.
    pub fn lightweight(config: &RuntimeConfig) -> Self {
        let registry = non_blank(config.private_registry.as_deref());
        let auth = non_blank(config.private_registry_auth.as_deref());
        let registry_auth = match (registry, auth) {
            (Some(registry), Some(auth)) => {
                info!(
                    registry = %registry,
                    "PRIVATE_REGISTRY_AUTH is set, using auth for matching images"
                );
                Some(RegistryAuth {
                    registry: registry.to_string(),
                    auth: auth.to_string(),
                })
            }
            (Some(_), None) => {
                warn!("PRIVATE_REGISTRY is set but not PRIVATE_REGISTRY_AUTH, ignoring");
                None
            }
            (None, Some(_)) => {
                warn!("PRIVATE_REGISTRY_AUTH is set but not PRIVATE_REGISTRY, ignoring");
                None
            }
            (None, None) => None,
        };

        Self::Lightweight {
            binary: config.lightweight_binary.clone(),
            registry_auth,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuntimeBackend::Standard { .. } => "standard",
            RuntimeBackend::Lightweight { .. } => "lightweight",
        }
    }

    /// Command that pulls `image`.
    pub fn pull_command(&self, image: &ImageReference) -> CommandSpec {
        match self {
            RuntimeBackend::Standard { binary, .. } => {
                CommandSpec::new(binary).arg("pull").arg(image.as_str())
            }
            RuntimeBackend::Lightweight {
                binary,
                registry_auth,
            } => {
                let cmd = CommandSpec::new(binary).arg("pull");
                let cmd = match registry_auth {
                    Some(auth) if image.mentions(&auth.registry) => {
                        cmd.arg("--auth").secret_arg(&auth.auth)
                    }
                    _ => cmd,
                };
                cmd.arg(image.as_str())
            }
        }
    }

    /// Credential-helper command needed before pulling `image`, if any.
    ///
    /// Only the Standard backend uses the helper. Callers decide whether it
    /// already ran.
    pub fn login_command(&self, image: &ImageReference) -> Option<CommandSpec> {
        match self {
            RuntimeBackend::Standard {
                credential_helper, ..
            } if image.mentions(&credential_helper.registry_fragment) => {
                Some(credential_helper.command())
            }
            _ => None,
        }
    }
}

/// An empty fragment would match every image, so blank values count as unset.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn socket_present(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| !meta.is_dir())
        .unwrap_or(false)
}
