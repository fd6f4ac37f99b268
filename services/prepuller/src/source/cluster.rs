//! Harvesting image references from live cluster workloads.
//!
//! One unpaginated `list` call per namespace against either Pods or
//! Deployments. A failing or empty namespace is logged and skipped.

use std::fmt;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, PodSpec};
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::{info, warn};

use super::namespace::{Namespace, NamespaceSet};
use crate::error::PrepullError;
use crate::image::ImageReference;

/// Workload resource kind to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkloadKind {
    #[default]
    Pods,
    Deployments,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadKind::Pods => f.write_str("Pods"),
            WorkloadKind::Deployments => f.write_str("Deployments"),
        }
    }
}

/// A listed workload and the images its pod template references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// Object name.
    pub name: String,

    /// Init container images followed by container images.
    pub images: Vec<ImageReference>,
}

/// Read-only access to cluster workloads.
#[async_trait]
pub trait WorkloadLister: Send + Sync {
    /// List every workload of `kind` in `namespace`.
    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &Namespace,
    ) -> anyhow::Result<Vec<Workload>>;
}

/// [`WorkloadLister`] backed by the Kubernetes API server.
pub struct KubeLister {
    client: Client,
}

impl KubeLister {
    /// Connect using in-cluster config, falling back to the local kubeconfig.
    pub async fn connect() -> Result<Self, PrepullError> {
        let config = kube::Config::infer().await.map_err(|e| {
            PrepullError::ClusterUnavailable(format!("failed to load cluster config: {e}"))
        })?;
        let client = Client::try_from(config).map_err(|e| {
            PrepullError::ClusterUnavailable(format!("failed to create client: {e}"))
        })?;
        Ok(Self { client })
    }

    fn api<K>(&self, namespace: &Namespace) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match namespace {
            Namespace::All => Api::all(self.client.clone()),
            Namespace::Named(name) => Api::namespaced(self.client.clone(), name),
        }
    }
}

#[async_trait]
impl WorkloadLister for KubeLister {
    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &Namespace,
    ) -> anyhow::Result<Vec<Workload>> {
        let params = ListParams::default();
        let workloads: Vec<Workload> = match kind {
            WorkloadKind::Pods => self
                .api::<Pod>(namespace)
                .list(&params)
                .await?
                .items
                .iter()
                .map(pod_workload)
                .collect(),
            WorkloadKind::Deployments => self
                .api::<Deployment>(namespace)
                .list(&params)
                .await?
                .items
                .iter()
                .map(deployment_workload)
                .collect(),
        };
        Ok(workloads)
    }
}

/// Images referenced by a pod spec: init containers first, then containers.
pub fn pod_spec_images(spec: &PodSpec) -> Vec<ImageReference> {
    spec.init_containers
        .iter()
        .flatten()
        .chain(spec.containers.iter())
        .filter_map(|container| container.image.as_deref())
        .map(ImageReference::from)
        .collect()
}

fn pod_workload(pod: &Pod) -> Workload {
    Workload {
        name: pod.metadata.name.clone().unwrap_or_default(),
        images: pod.spec.as_ref().map(pod_spec_images).unwrap_or_default(),
    }
}

fn deployment_workload(deployment: &Deployment) -> Workload {
    Workload {
        name: deployment.metadata.name.clone().unwrap_or_default(),
        images: deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.template.spec.as_ref())
            .map(pod_spec_images)
            .unwrap_or_default(),
    }
}

/// Collect every image reference across `namespaces`, duplicates included.
pub async fn harvest(
    lister: &dyn WorkloadLister,
    kind: WorkloadKind,
    namespaces: &NamespaceSet,
) -> Vec<ImageReference> {
    let mut images = Vec::new();

    for namespace in namespaces.iter() {
        match namespace {
            Namespace::All => info!(kind = %kind, "Listing workloads in all namespaces"),
            Namespace::Named(name) => info!(kind = %kind, namespace = %name, "Listing workloads"),
        }

        let workloads = match lister.list_workloads(kind, namespace).await {
            Ok(workloads) => workloads,
            Err(e) => {
                warn!(
                    kind = %kind,
                    namespace = %namespace,
                    error = %e,
                    "Failed to list workloads, skipping namespace"
                );
                continue;
            }
        };

        if workloads.is_empty() {
            info!(kind = %kind, namespace = %namespace, "None found");
            continue;
        }

        for workload in workloads {
            info!(
                workload = %workload.name,
                image_count = workload.images.len(),
                "Found workload"
            );
            for image in workload.images {
                info!(workload = %workload.name, image = %image, "Found image");
                images.push(image);
            }
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::api::core::v1::{Container, PodTemplateSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn container(image: Option<&str>) -> Container {
        Container {
            name: "c".to_string(),
            image: image.map(str::to_string),
            ..Default::default()
        }
    }

    fn spec(init: &[&str], containers: &[&str]) -> PodSpec {
        PodSpec {
            init_containers: if init.is_empty() {
                None
            } else {
                Some(init.iter().map(|i| container(Some(*i))).collect())
            },
            containers: containers.iter().map(|i| container(Some(*i))).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_init_containers_come_first() {
        let images = pod_spec_images(&spec(&["busybox:1"], &["app:1", "sidecar:2"]));
        assert_eq!(
            images,
            vec![
                ImageReference::from("busybox:1"),
                ImageReference::from("app:1"),
                ImageReference::from("sidecar:2"),
            ]
        );
    }

    #[test]
    fn test_containers_without_image_are_skipped() {
        let spec = PodSpec {
            containers: vec![container(None), container(Some("app:1"))],
            ..Default::default()
        };
        assert_eq!(pod_spec_images(&spec), vec![ImageReference::from("app:1")]);
    }

    #[test]
    fn test_pod_workload_extraction() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                ..Default::default()
            },
            spec: Some(spec(&[], &["nginx:1.25", "nginx:1.25"])),
            ..Default::default()
        };

        let workload = pod_workload(&pod);
        assert_eq!(workload.name, "web-0");
        assert_eq!(workload.images.len(), 2);
    }

    #[test]
    fn test_deployment_images_come_from_template() {
        let deployment = Deployment {
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                template: PodTemplateSpec {
                    spec: Some(spec(&["migrate:3"], &["api:3"])),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };

        let workload = deployment_workload(&deployment);
        assert_eq!(workload.name, "api");
        assert_eq!(
            workload.images,
            vec![ImageReference::from("migrate:3"), ImageReference::from("api:3")]
        );
    }

    #[test]
    fn test_deployment_without_spec_has_no_images() {
        let workload = deployment_workload(&Deployment::default());
        assert!(workload.images.is_empty());
    }
}
