//! Mock Store implementation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::storage::{
    AttributeValue, Item, Key, QueryPage, RangeQuery, Result, StorageError, Store, WriteRequest,
    PARTITION_KEY, SORT_KEY,
};

/// Attribute the subject index is keyed by.
const SUBJECT_ATTRIBUTE: &str = "Subject";

/// Records of one partition, ordered by sort key.
type Partition = BTreeMap<String, Item>;

/// Store that keeps every record in memory.
///
/// Partitions are ordered maps, so sort-key order is byte order, the same
/// ordering DynamoDB applies to string sort keys.
#[derive(Default)]
pub struct MockStore {
    partitions: RwLock<BTreeMap<String, Partition>>,
    fail_on_read: RwLock<bool>,
    fail_on_write: RwLock<bool>,
    fail_on_batch_write: RwLock<bool>,
    writes: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    /// Fail batch writes only, leaving single-item writes working.
    pub async fn set_fail_on_batch_write(&self, fail: bool) {
        *self.fail_on_batch_write.write().await = fail;
    }

    /// Number of mutations applied so far (puts and deletes, batched or not).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Whether a record with this key exists.
    pub async fn contains(&self, key: &Key) -> bool {
        self.partitions
            .read()
            .await
            .get(&key.partition_key)
            .is_some_and(|partition| partition.contains_key(&key.sort_key))
    }

    /// Total number of stored records.
    pub async fn len(&self) -> usize {
        self.partitions.read().await.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }

    async fn check_write(&self) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }

    fn insert(partitions: &mut BTreeMap<String, Partition>, item: Item) -> Result<()> {
        let key = Key::of(&item).ok_or_else(|| {
            StorageError::Unavailable(format!(
                "item is missing string {} / {} attributes",
                PARTITION_KEY, SORT_KEY
            ))
        })?;
        partitions
            .entry(key.partition_key)
            .or_default()
            .insert(key.sort_key, item);
        Ok(())
    }

    fn remove(partitions: &mut BTreeMap<String, Partition>, key: &Key) {
        if let Some(partition) = partitions.get_mut(&key.partition_key) {
            partition.remove(&key.sort_key);
            if partition.is_empty() {
                partitions.remove(&key.partition_key);
            }
        }
    }
}

#[async_trait]
impl Store for MockStore {
    async fn get(&self, key: &Key) -> Result<Option<Item>> {
        self.check_read().await?;
        Ok(self
            .partitions
            .read()
            .await
            .get(&key.partition_key)
            .and_then(|partition| partition.get(&key.sort_key))
            .cloned())
    }

    async fn put(&self, item: Item) -> Result<()> {
        self.check_write().await?;
        let mut partitions = self.partitions.write().await;
        Self::insert(&mut partitions, item)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn put_if_absent(&self, item: Item) -> Result<bool> {
        self.check_write().await?;
        let key = Key::of(&item)
            .ok_or_else(|| StorageError::Unavailable("item is missing key attributes".into()))?;

        // Check and insert under one write lock
        let mut partitions = self.partitions.write().await;
        let taken = partitions
            .get(&key.partition_key)
            .is_some_and(|partition| partition.contains_key(&key.sort_key));
        if taken {
            return Ok(false);
        }
        Self::insert(&mut partitions, item)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.check_write().await?;
        Self::remove(&mut *self.partitions.write().await, key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query(&self, query: &RangeQuery) -> Result<QueryPage> {
        self.check_read().await?;
        let partitions = self.partitions.read().await;
        let Some(partition) = partitions.get(&query.partition_key) else {
            return Ok(QueryPage::default());
        };

        let start = query
            .exclusive_start_key
            .as_ref()
            .and_then(Key::of)
            .map(|key| key.sort_key);

        let ordered: Box<dyn Iterator<Item = (&String, &Item)> + '_> = if query.scan_forward {
            Box::new(partition.iter())
        } else {
            Box::new(partition.iter().rev())
        };

        let mut items = Vec::new();
        let mut last_evaluated_key = None;
        for (sort_key, item) in ordered {
            if !query.sort_key.matches(sort_key) {
                continue;
            }
            if let Some(start) = &start {
                let resumed = if query.scan_forward {
                    sort_key > start
                } else {
                    sort_key < start
                };
                if !resumed {
                    continue;
                }
            }
            items.push(item.clone());
            if query.limit.is_some_and(|limit| items.len() >= limit as usize) {
                last_evaluated_key =
                    Some(Key::new(query.partition_key.clone(), sort_key.clone()).to_item());
                break;
            }
        }

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    async fn query_subject_index(
        &self,
        subject: &str,
        partition_prefix: &str,
    ) -> Result<Vec<Item>> {
        self.check_read().await?;
        let partitions = self.partitions.read().await;
        Ok(partitions
            .range(partition_prefix.to_string()..)
            .take_while(|(pk, _)| pk.starts_with(partition_prefix))
            .flat_map(|(_, partition)| partition.values())
            .filter(|item| {
                item.get(SUBJECT_ATTRIBUTE).and_then(AttributeValue::as_s) == Some(subject)
            })
            .cloned()
            .collect())
    }

    async fn batch_get(&self, keys: &[Key]) -> Result<Vec<Item>> {
        self.check_read().await?;
        let partitions = self.partitions.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| {
                partitions
                    .get(&key.partition_key)
                    .and_then(|partition| partition.get(&key.sort_key))
                    .cloned()
            })
            .collect())
    }

    async fn batch_write(&self, writes: Vec<WriteRequest>) -> Result<()> {
        self.check_write().await?;
        if *self.fail_on_batch_write.read().await {
            return Err(StorageError::Unavailable(
                "injected batch write failure".into(),
            ));
        }

        let mut partitions = self.partitions.write().await;
        for write in writes {
            match write {
                WriteRequest::Put(item) => Self::insert(&mut partitions, item)?,
                WriteRequest::Delete(key) => Self::remove(&mut partitions, &key),
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
