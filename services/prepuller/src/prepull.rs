//! One prepull run: discover, select, detect runtime, pull.

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::command::{CommandRunner, ProcessRunner};
use crate::config::Config;
use crate::error::PrepullError;
use crate::puller::{PullOrchestrator, PullSummary, PULL_WORKERS};
use crate::runtime::RuntimeBackend;
use crate::selection::select_images;
use crate::source::{self, KubeLister, WorkloadLister};

/// Run against the real cluster and container runtime.
pub async fn run(config: Config) -> Result<PullSummary, PrepullError> {
    run_with(config, KubeLister::connect, Arc::new(ProcessRunner), PULL_WORKERS).await
}

/// Run with injected collaborators.
///
/// `connect` is only called when cluster discovery is needed.
pub async fn run_with<L, F, Fut>(
    config: Config,
    connect: F,
    runner: Arc<dyn CommandRunner>,
    workers: usize,
) -> Result<PullSummary, PrepullError>
where
    L: WorkloadLister,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<L, PrepullError>>,
{
    let raw = source::collect_images(&config.source, connect).await?;
    info!(count = raw.len(), "Harvested image references");

    let images = select_images(&raw, &config.selection);
    let backend = RuntimeBackend::detect(&config.runtime);

    let mut orchestrator = PullOrchestrator::new(backend, runner, workers);
    let summary = orchestrator.pull_all(&images).await;

    info!(
        attempted = summary.attempted(),
        pulled = summary.pulled.len(),
        failed = summary.failed.len(),
        "Prepull complete"
    );

    Ok(summary)
}
