//! Bootstrap utilities for tagtrail binaries.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LOG_ENV_VAR};
use crate::services::Services;
use crate::storage::{init_storage, StorageError};

/// Initialize tracing with the TAGTRAIL_LOG environment variable.
///
/// Defaults to "info" level if TAGTRAIL_LOG is not set. Logs go to stderr so
/// stdout stays free for responses.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the use cases over the configured store.
pub async fn build_services(config: &Config) -> Result<Services, StorageError> {
    let store = init_storage(&config.storage).await?;
    info!(backend = ?config.storage.storage_type, "Services ready");
    Ok(Services::new(store))
}
