//! Fakes shared by the prepuller integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use harpoon_prepuller::command::{CommandOutput, CommandRunner, CommandSpec};
use harpoon_prepuller::source::{Namespace, Workload, WorkloadKind, WorkloadLister};
use harpoon_prepuller::ImageReference;

/// Command runner that records invocations instead of spawning processes.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    /// Pulls of these images exit non-zero.
    failing_images: HashSet<String>,
    /// Pulls of these images fail to start.
    unspawnable_images: HashSet<String>,
    /// The credential helper exits non-zero.
    fail_login: bool,
    /// How long each pull takes.
    pull_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, image: &str) -> Self {
        self.failing_images.insert(image.to_string());
        self
    }

    pub fn unspawnable(mut self, image: &str) -> Self {
        self.unspawnable_images.insert(image.to_string());
        self
    }

    pub fn failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    pub fn with_pull_delay(mut self, delay: Duration) -> Self {
        self.pull_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Pull invocations, in the order they started.
    pub fn pulls(&self) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.args.first().map(String::as_str) == Some("pull"))
            .collect()
    }

    /// Credential-helper invocations.
    pub fn logins(&self) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.args.first().map(String::as_str) == Some("configure-docker"))
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &CommandSpec) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());

        if command.args.first().map(String::as_str) == Some("configure-docker") {
            return Ok(CommandOutput {
                code: Some(if self.fail_login { 1 } else { 0 }),
                stdout: String::new(),
                stderr: if self.fail_login {
                    "no credentials".to_string()
                } else {
                    String::new()
                },
            });
        }

        let image = command.args.last().cloned().unwrap_or_default();
        if self.unspawnable_images.contains(&image) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "binary not found",
            ));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.pull_delay.is_zero() {
            tokio::time::sleep(self.pull_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_images.contains(&image) {
            Ok(CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: format!("Error response from daemon: manifest for {image} not found"),
            })
        } else {
            Ok(CommandOutput {
                code: Some(0),
                stdout: format!("Pulled {image}"),
                stderr: String::new(),
            })
        }
    }
}

/// Workload lister backed by a fixed map of namespace to workloads.
#[derive(Default)]
pub struct FakeLister {
    workloads: HashMap<String, Vec<Workload>>,
    failing: HashSet<String>,
    /// Every list call made, shared so tests can inspect it after handing the fake over.
    pub listed: Arc<Mutex<Vec<(WorkloadKind, Namespace)>>>,
}

impl FakeLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a workload to `namespace` (`*` for the cluster-wide list).
    pub fn with_workload(mut self, namespace: &str, name: &str, images: &[&str]) -> Self {
        self.workloads
            .entry(namespace.to_string())
            .or_default()
            .push(Workload {
                name: name.to_string(),
                images: images.iter().map(|i| ImageReference::from(*i)).collect(),
            });
        self
    }

    pub fn failing(mut self, namespace: &str) -> Self {
        self.failing.insert(namespace.to_string());
        self
    }
}

#[async_trait]
impl WorkloadLister for FakeLister {
    async fn list_workloads(
        &self,
        kind: WorkloadKind,
        namespace: &Namespace,
    ) -> anyhow::Result<Vec<Workload>> {
        self.listed.lock().unwrap().push((kind, namespace.clone()));

        let key = namespace.to_string();
        if self.failing.contains(&key) {
            anyhow::bail!("namespaces \"{key}\" is forbidden");
        }
        Ok(self.workloads.get(&key).cloned().unwrap_or_default())
    }
}

/// Shorthand for a list of image references.
pub fn images(refs: &[&str]) -> Vec<ImageReference> {
    refs.iter().map(|r| ImageReference::from(*r)).collect()
}
