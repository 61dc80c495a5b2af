//! Tag fan-out.
//!
//! Keeps the Tag vocabulary and EventTag join records in step with an
//! event's tag set. Every write is a put or delete by key, so replaying an
//! operation leaves the table unchanged. Nothing here is transactional: a
//! failure part way through leaves the records already written in place.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::keys::{EventTag, Record, Tag};
use crate::storage::{Result, Store, WriteRequest};

/// Drop repeated tag values, keeping first-seen order. Matching is exact.
pub fn distinct(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.iter()
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

fn event_tag(account_id: &str, value: &str, date: DateTime<Utc>) -> EventTag {
    EventTag {
        account_id: account_id.to_string(),
        value: value.to_string(),
        date,
    }
}

/// Upsert Tag and EventTag records for every tag in `tags`.
///
/// Tag vocabulary is written first as one batch, then the join records as a
/// second batch.
pub async fn create(
    store: &dyn Store,
    account_id: &str,
    date: DateTime<Utc>,
    tags: &[String],
) -> Result<()> {
    let tags = distinct(tags);
    if tags.is_empty() {
        return Ok(());
    }

    let vocabulary = tags
        .iter()
        .map(|value| {
            WriteRequest::Put(
                Tag {
                    account_id: account_id.to_string(),
                    value: value.clone(),
                }
                .to_item(),
            )
        })
        .collect();
    store.batch_write(vocabulary).await?;

    let joins = tags
        .iter()
        .map(|value| WriteRequest::Put(event_tag(account_id, value, date).to_item()))
        .collect();
    store.batch_write(joins).await?;

    debug!(account_id = %account_id, count = tags.len(), "Fanned out event tags");
    Ok(())
}

/// Delete the EventTag records of `tags`. Tag vocabulary is left alone.
pub async fn delete(
    store: &dyn Store,
    account_id: &str,
    date: DateTime<Utc>,
    tags: &[String],
) -> Result<()> {
    let tags = distinct(tags);
    if tags.is_empty() {
        return Ok(());
    }

    let deletes = tags
        .iter()
        .map(|value| WriteRequest::Delete(event_tag(account_id, value, date).key()))
        .collect();
    store.batch_write(deletes).await?;

    debug!(account_id = %account_id, count = tags.len(), "Removed event tags");
    Ok(())
}

/// Move an event from `old_tags` to `new_tags`.
///
/// EventTags of tags dropped from the set are deleted; every tag in the new
/// set is rewritten, including ones that were already present.
pub async fn update(
    store: &dyn Store,
    account_id: &str,
    date: DateTime<Utc>,
    old_tags: &[String],
    new_tags: &[String],
) -> Result<()> {
    let new_tags = distinct(new_tags);
    let removed: Vec<String> = distinct(old_tags)
        .into_iter()
        .filter(|tag| !new_tags.contains(tag))
        .collect();

    delete(store, account_id, date, &removed).await?;
    create(store, account_id, date, &new_tags).await
}
