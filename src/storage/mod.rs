//! Storage implementations.

use std::sync::Arc;

use tracing::info;

mod item;
mod store;

pub mod mock;

#[cfg(feature = "dynamo")]
pub mod dynamo;

pub use item::{AttributeValue, Item, Key, PARTITION_KEY, SORT_KEY};
pub use mock::MockStore;
pub use store::{QueryPage, RangeQuery, SortKeyCondition, Store, WriteRequest};

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoStore;

use crate::config::{StorageConfig, StorageType};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("DynamoDB {operation} failed: {message}")]
    Dynamo {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} left {count} item(s) unprocessed")]
    Unprocessed { operation: &'static str, count: usize },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Backend not enabled: {0}")]
    BackendDisabled(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Initialize storage based on configuration.
pub async fn init_storage(config: &StorageConfig) -> Result<Arc<dyn Store>> {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: in-memory");
            Ok(Arc::new(MockStore::new()))
        }
        #[cfg(feature = "dynamo")]
        StorageType::Dynamo => {
            info!(
                table = %config.dynamo.table_name,
                index = %config.dynamo.subject_index,
                "Storage: dynamo"
            );
            let store = DynamoStore::new(
                &config.dynamo.table_name,
                &config.dynamo.subject_index,
                config.dynamo.endpoint_url.as_deref(),
            )
            .await;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamo"))]
        StorageType::Dynamo => {
            tracing::error!("DynamoDB storage requested but 'dynamo' feature is not enabled");
            Err(StorageError::BackendDisabled("dynamo"))
        }
    }
}
