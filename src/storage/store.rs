//! Store trait definition.

use async_trait::async_trait;

use super::item::{Item, Key};
use super::Result;

/// Condition on the sort key of a range query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKeyCondition {
    /// Every record in the partition.
    Any,
    /// Sort key between `from` and `to`, both inclusive.
    Between { from: String, to: String },
    /// Sort key starts with the prefix.
    BeginsWith(String),
}

impl SortKeyCondition {
    /// Whether a sort key satisfies this condition.
    pub fn matches(&self, sort_key: &str) -> bool {
        match self {
            SortKeyCondition::Any => true,
            SortKeyCondition::Between { from, to } => {
                sort_key >= from.as_str() && sort_key <= to.as_str()
            }
            SortKeyCondition::BeginsWith(prefix) => sort_key.starts_with(prefix.as_str()),
        }
    }
}

/// A single-partition range query.
#[derive(Debug, Clone)]
pub struct RangeQuery {
    pub partition_key: String,
    pub sort_key: SortKeyCondition,
    /// Maximum number of items evaluated for this page.
    pub limit: Option<u32>,
    /// Ascending sort-key order when true, descending when false.
    pub scan_forward: bool,
    /// Resume after this key (exclusive).
    pub exclusive_start_key: Option<Item>,
}

impl RangeQuery {
    /// Query a whole partition in ascending order, no limit.
    pub fn partition(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: SortKeyCondition::Any,
            limit: None,
            scan_forward: true,
            exclusive_start_key: None,
        }
    }

    pub fn between(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.sort_key = SortKeyCondition::Between {
            from: from.into(),
            to: to.into(),
        };
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn descending(mut self) -> Self {
        self.scan_forward = false;
        self
    }

    pub fn start_after(mut self, key: Option<Item>) -> Self {
        self.exclusive_start_key = key;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Key of the last evaluated item when the page was cut short by the limit.
    pub last_evaluated_key: Option<Item>,
}

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Item),
    Delete(Key),
}

/// Interface for the single-table key-value store.
///
/// Every record lives under a composite `(PartitionKey, SortKey)` primary key.
/// Range queries operate within one partition. A secondary index keyed by
/// `Subject` (sorted by `PartitionKey`) provides the membership reverse lookup.
///
/// Implementations:
/// - `DynamoStore`: DynamoDB storage
/// - `MockStore`: In-memory store for tests and local runs
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a single record by primary key.
    async fn get(&self, key: &Key) -> Result<Option<Item>>;

    /// Write a record, replacing any record with the same key.
    async fn put(&self, item: Item) -> Result<()>;

    /// Write a record only if no record with the same key exists.
    ///
    /// Returns `false` when the key is already taken.
    async fn put_if_absent(&self, item: Item) -> Result<bool>;

    /// Delete a record. Deleting an absent key succeeds.
    async fn delete(&self, key: &Key) -> Result<()>;

    /// Run one page of a range query.
    async fn query(&self, query: &RangeQuery) -> Result<QueryPage>;

    /// Reverse lookup through the subject index.
    ///
    /// Returns every record whose `Subject` equals `subject` and whose
    /// partition key begins with `partition_prefix`, across all pages.
    async fn query_subject_index(&self, subject: &str, partition_prefix: &str)
        -> Result<Vec<Item>>;

    /// Fetch many records by key. Missing keys are omitted and result order
    /// is not guaranteed to match `keys`.
    async fn batch_get(&self, keys: &[Key]) -> Result<Vec<Item>>;

    /// Apply many independent writes. Not atomic.
    async fn batch_write(&self, writes: Vec<WriteRequest>) -> Result<()>;
}
