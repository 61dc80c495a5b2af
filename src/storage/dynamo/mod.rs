//! DynamoDB storage implementation.
//!
//! Table schema:
//! - `PartitionKey` (String, hash key)
//! - `SortKey` (String, range key)
//! - global secondary index (default `Subject-index`): `Subject` hash key,
//!   `PartitionKey` range key

mod convert;
mod store;

pub use store::DynamoStore;
