//! Image discovery.
//!
//! Images come from exactly one place per run:
//! - the static list file, when it exists, or
//! - the cluster, by listing Pods or Deployments per namespace.

mod cluster;
mod namespace;
mod static_list;

use std::future::Future;
use std::path::PathBuf;

pub use cluster::{harvest, pod_spec_images, KubeLister, Workload, WorkloadKind, WorkloadLister};
pub use namespace::{Namespace, NamespaceSet, ALL_NAMESPACES};
pub use static_list::read_static_list;

use crate::error::PrepullError;
use crate::image::ImageReference;

/// Discovery configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Static image list; its presence disables cluster discovery.
    pub static_list_path: PathBuf,

    /// Mounted service-account namespace, used when there is no override.
    pub namespace_file: PathBuf,

    /// Raw `NAMESPACES` value, if set.
    pub namespaces_override: Option<String>,

    /// Which workload objects to harvest.
    pub workload_kind: WorkloadKind,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            static_list_path: PathBuf::from("/config/images"),
            namespace_file: PathBuf::from("/var/run/secrets/kubernetes.io/serviceaccount/namespace"),
            namespaces_override: None,
            workload_kind: WorkloadKind::Pods,
        }
    }
}

/// Produce the raw image list for this run.
///
/// `connect` is only awaited when there is no static list, after namespaces
/// have been resolved, so a static-list run never touches the cluster.
pub async fn collect_images<L, F, Fut>(
    config: &SourceConfig,
    connect: F,
) -> Result<Vec<ImageReference>, PrepullError>
where
    L: WorkloadLister,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<L, PrepullError>>,
{
    if let Some(images) = read_static_list(&config.static_list_path)? {
        return Ok(images);
    }

    let namespaces =
        NamespaceSet::resolve(config.namespaces_override.as_deref(), &config.namespace_file)?;
    let lister = connect().await?;

    Ok(harvest(&lister, config.workload_kind, &namespaces).await)
}
