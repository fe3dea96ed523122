//! Migrator Main Entry Point
//!
//! This is the main binary for the record migrator. It loads the job
//! description, wires the endpoints, and runs the migration orchestrator.

use dotenv::dotenv;
use migrator::{Dependencies, MigrationError};
use migrator_pipeline::JobOutcome;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("migrator=info,migrator_pipeline=info,migrator_endpoint=info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    info!(
        service_name = "migrator",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), MigrationError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting record migrator");

    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.orchestrator.run().await {
        Ok(JobOutcome::Completed { records_updated }) => {
            info!(records_updated, "Migration completed successfully");
            Ok(())
        }
        Ok(JobOutcome::ValidateOnly) => {
            info!("Validation completed successfully, nothing migrated");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Migration failed");
            Err(e.into())
        }
    }
}
