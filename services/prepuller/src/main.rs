//! Harpoon prepuller binary.
//!
//! Exits 0 once the pull phase finishes, whatever happened to individual
//! images. Exits 1 only for configuration errors.

use std::error::Error;
use std::process::ExitCode;

use harpoon_prepuller::{prepull, Config};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting harpoon prepuller");

    let result = match Config::from_env() {
        Ok(config) => prepull::run(config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(reason = e.reason_code(), error = %e, "Prepull failed");
            let mut source = e.source();
            while let Some(cause) = source {
                error!(cause = %cause, "caused by");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
