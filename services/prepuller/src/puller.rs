//! Bounded-concurrency pull orchestrator.
//!
//! Images are dispatched in list order to at most `workers` concurrent pull
//! jobs. Completion order is unordered. A failing pull is logged and the batch
//! carries on; nothing is retried and there is no overall timeout.
//!
//! The hosted-registry credential helper runs at most once per run, on the
//! submission path, right before the first image that needs it is dispatched.
//! Pulls already running at that point are not paused, so the credential
//! setup is best-effort rather than a barrier.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::command::{CommandRunner, CommandSpec};
use crate::image::ImageReference;
use crate::runtime::RuntimeBackend;
use crate::selection::FinalPullList;

/// Number of concurrent pulls used by the prepuller binary.
pub const PULL_WORKERS: usize = 10;

/// Outcome of one pull job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    Pulled(ImageReference),
    Failed {
        image: ImageReference,
        reason: String,
    },
}

/// What happened to every dispatched image. Only used for the final log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullSummary {
    pub pulled: Vec<ImageReference>,
    pub failed: Vec<(ImageReference, String)>,
}

impl PullSummary {
    pub fn attempted(&self) -> usize {
        self.pulled.len() + self.failed.len()
    }

    fn record(&mut self, outcome: PullOutcome) {
        match outcome {
            PullOutcome::Pulled(image) => self.pulled.push(image),
            PullOutcome::Failed { image, reason } => self.failed.push((image, reason)),
        }
    }
}

/// Hosted-registry credential state. Leaves `Unconfigured` at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unconfigured,
    Configured,
    /// The helper ran and failed; pulls stay unauthenticated.
    Failed,
}

/// Pulls a [`FinalPullList`] through the selected runtime backend.
pub struct PullOrchestrator {
    backend: RuntimeBackend,
    runner: Arc<dyn CommandRunner>,
    workers: usize,
    auth: AuthState,
}

impl PullOrchestrator {
    /// Create an orchestrator with a pool of `workers` (at least one).
    pub fn new(backend: RuntimeBackend, runner: Arc<dyn CommandRunner>, workers: usize) -> Self {
        Self {
            backend,
            runner,
            workers: workers.max(1),
            auth: AuthState::default(),
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    /// Pull every image and wait for all jobs to finish.
    pub async fn pull_all(&mut self, images: &FinalPullList) -> PullSummary {
        info!(
            backend = self.backend.name(),
            images = images.len(),
            workers = self.workers,
            "Pulling images"
        );

        let slots = Arc::new(Semaphore::new(self.workers));
        let mut jobs = JoinSet::new();
        let mut summary = PullSummary::default();

        for image in images {
            self.ensure_registry_login(image).await;

            let permit = Arc::clone(&slots)
                .acquire_owned()
                .await
                .expect("worker pool semaphore is never closed");

            let command = self.backend.pull_command(image);
            let runner = Arc::clone(&self.runner);
            let image = image.clone();
            debug!(image = %image, "Dispatching pull");

            jobs.spawn(async move {
                let outcome = pull_one(runner.as_ref(), &command, image).await;
                drop(permit);
                outcome
            });
        }

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok(outcome) => summary.record(outcome),
                Err(e) => error!(error = %e, "Pull job panicked"),
            }
        }

        summary
    }

    /// Run the credential helper if `image` needs it and it has not run yet.
    async fn ensure_registry_login(&mut self, image: &ImageReference) {
        if self.auth != AuthState::Unconfigured {
            return;
        }
        let Some(command) = self.backend.login_command(image) else {
            return;
        };

        info!(image = %image, command = %command, "Configuring registry credentials");
        match self.runner.run(&command).await {
            Ok(output) if output.success() => {
                info!(output = %output.combined(), "Registry credentials configured");
                self.auth = AuthState::Configured;
            }
            Ok(output) => {
                self.auth = AuthState::Failed;
                warn!(
                    exit_code = ?output.code,
                    output = %output.combined(),
                    "Failed to configure registry credentials, pulling unauthenticated"
                );
            }
            Err(e) => {
                self.auth = AuthState::Failed;
                warn!(
                    error = %e,
                    "Failed to run credential helper, pulling unauthenticated"
                );
            }
        }
    }
}

async fn pull_one(
    runner: &dyn CommandRunner,
    command: &CommandSpec,
    image: ImageReference,
) -> PullOutcome {
    let start = Instant::now();

    match runner.run(command).await {
        Ok(output) if output.success() => {
            info!(
                image = %image,
                duration_ms = start.elapsed().as_millis() as u64,
                "Pulled image"
            );
            PullOutcome::Pulled(image)
        }
        Ok(output) => {
            let reason = format!("exit code {:?}", output.code);
            error!(
                image = %image,
                command = %command,
                output = %output.combined(),
                error = %reason,
                "Failed to pull image"
            );
            PullOutcome::Failed { image, reason }
        }
        Err(e) => {
            error!(
                image = %image,
                command = %command,
                error = %e,
                "Failed to run pull command"
            );
            PullOutcome::Failed {
                image,
                reason: e.to_string(),
            }
        }
    }
}
