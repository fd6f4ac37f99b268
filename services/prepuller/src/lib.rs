//! Harpoon image prepuller.
//!
//! Runs once per node (typically as a DaemonSet pod) and pulls the images the
//! cluster is likely to schedule there, so workloads start without waiting on
//! the registry.
//!
//! ## Pipeline
//!
//! ```text
//! source     static list, or Pods/Deployments per namespace
//!   -> selection  count, dedupe, ignore-filter, rank, cap
//!   -> runtime    standard vs lightweight backend
//!   -> puller     bounded worker pool, one-time registry login
//! ```
//!
//! Only configuration problems fail the run. Discovery, credential and pull
//! failures are logged and the run still succeeds.

pub mod command;
pub mod config;
pub mod error;
pub mod image;
pub mod prepull;
pub mod puller;
pub mod runtime;
pub mod selection;
pub mod source;

pub use config::Config;
pub use error::{ConfigError, PrepullError};
pub use image::ImageReference;
pub use puller::{PullOrchestrator, PullSummary, PULL_WORKERS};
pub use runtime::RuntimeBackend;
pub use selection::{select_images, FinalPullList, SelectionPolicy};
