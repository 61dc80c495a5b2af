//! Tag vocabulary listing.

use std::sync::Arc;

use tracing::info;

use super::{check, require_scope, Result};
use crate::identity::{Identity, EVENT_SCOPE};
use crate::keys::{tag_partition_key, Record, Tag};
use crate::models::TagDto;
use crate::storage::{RangeQuery, Store};
use crate::validation;

#[derive(Clone)]
pub struct TagService {
    store: Arc<dyn Store>,
}

impl TagService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Every tag value used in an account, reading all pages.
    pub async fn list(&self, identity: &Identity, account_id: Option<&str>) -> Result<Vec<TagDto>> {
        require_scope(identity, EVENT_SCOPE)?;

        let mut errors = Vec::new();
        validation::require(&mut errors, "AccountId", account_id);
        check(errors)?;
        let account_id = account_id.unwrap_or_default();

        info!(account_id = %account_id, "Listing tags");

        let mut tags = Vec::new();
        let mut start_key = None;
        loop {
            let query = RangeQuery::partition(tag_partition_key(account_id))
                .descending()
                .start_after(start_key.take());
            let page = self.store.query(&query).await?;
            for item in &page.items {
                tags.push(TagDto::from(&Tag::from_item(item)?));
            }
            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        info!(count = tags.len(), "Found tags");
        Ok(tags)
    }
}
