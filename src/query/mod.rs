//! Event listing and pagination.
//!
//! Two access patterns, picked by whether a tag filter is present:
//!
//! - plain: a newest-first range over `EVENT#ACCOUNT#<slug>` between the
//!   window's dates
//! - by tag: a newest-first range over `EVENT_TAG#ACCOUNT#<slug>` between
//!   `#TAG#<tag>#DATE#<from>` and `#TAG#<tag>#DATE#<to>`, whose join records
//!   are then resolved to Events with one batch get
//!
//! Both honor the caller's limit and resume from a pagination token.

pub mod cursor;

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tracing::{debug, info};

use crate::keys::{
    event_partition_key, event_tag_partition_key, event_tag_sort_key, format_date, Event,
    EventTag, KeyError, Record,
};
use crate::storage::{Key, RangeQuery, StorageError, Store};
use crate::validation::{self, codes, errmsg, FieldError};

/// Parameters of an event listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEventsInput {
    pub account_id: String,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: i32,
    pub tag: Option<String>,
    pub pagination_token: Option<String>,
}

impl ListEventsInput {
    /// Tag filter, ignoring a blank value.
    pub fn tag_filter(&self) -> Option<&str> {
        self.tag.as_deref().filter(|tag| !tag.trim().is_empty())
    }
}

/// One page of events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPage {
    pub items: Vec<Event>,
    pub pagination_token: Option<String>,
}

/// Errors from listing events.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid listing request")]
    Invalid(Vec<FieldError>),

    #[error("stored record is malformed: {0}")]
    Key(#[from] KeyError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Check a listing request. An empty result means the request is valid.
pub fn validate(input: &ListEventsInput) -> Vec<FieldError> {
    let mut errors = Vec::new();

    validation::require(&mut errors, "AccountId", Some(&input.account_id));

    if !validation::limit_in_range(input.limit) {
        errors.push(FieldError::new(
            "Limit",
            errmsg::LIMIT_OUT_OF_RANGE,
            codes::INVALID_INPUT,
        ));
    }

    match (input.from_date, input.to_date) {
        (None, Some(_)) => errors.push(FieldError::new(
            "FromDate",
            errmsg::FROM_DATE_REQUIRED,
            codes::NOT_EMPTY,
        )),
        (Some(_), None) => errors.push(FieldError::new(
            "ToDate",
            errmsg::TO_DATE_REQUIRED,
            codes::NOT_EMPTY,
        )),
        (Some(from), Some(to)) if to < from => errors.push(FieldError::new(
            "ToDate",
            errmsg::TO_DATE_BEFORE_FROM_DATE,
            codes::INVALID_INPUT,
        )),
        _ => {}
    }

    errors
}

/// Date window of a listing. Missing bounds default to the UTC day of `now`.
pub fn resolve_window(
    input: &ListEventsInput,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    (
        input.from_date.unwrap_or(today),
        input.to_date.unwrap_or(tomorrow),
    )
}

/// List one page of an account's events, newest first.
///
/// `now` anchors the default window.
pub async fn list_events(
    store: &dyn Store,
    input: &ListEventsInput,
    now: DateTime<Utc>,
) -> Result<EventPage, QueryError> {
    let errors = validate(input);
    if !errors.is_empty() {
        return Err(QueryError::Invalid(errors));
    }

    let (from, to) = resolve_window(input, now);
    let start_key = cursor::decode(input.pagination_token.as_deref());
    // validated to be positive
    let limit = input.limit.unsigned_abs();

    match input.tag_filter() {
        Some(tag) => list_by_tag(store, input, tag, from, to, limit, start_key).await,
        None => list_plain(store, input, from, to, limit, start_key).await,
    }
}

async fn list_plain(
    store: &dyn Store,
    input: &ListEventsInput,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: u32,
    start_key: Option<crate::storage::Item>,
) -> Result<EventPage, QueryError> {
    info!(
        account_id = %input.account_id,
        from = %format_date(from),
        to = %format_date(to),
        "Listing events"
    );

    let query = RangeQuery::partition(event_partition_key(&input.account_id))
        .between(format_date(from), format_date(to))
        .descending()
        .limit(limit)
        .start_after(start_key);
    let page = store.query(&query).await?;

    let items = page
        .items
        .iter()
        .map(Event::from_item)
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = items.len(), "Found events");

    Ok(EventPage {
        items,
        pagination_token: cursor::encode(page.last_evaluated_key.as_ref())?,
    })
}

async fn list_by_tag(
    store: &dyn Store,
    input: &ListEventsInput,
    tag: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: u32,
    start_key: Option<crate::storage::Item>,
) -> Result<EventPage, QueryError> {
    info!(
        account_id = %input.account_id,
        tag = %tag,
        from = %format_date(from),
        to = %format_date(to),
        "Listing events by tag"
    );

    let query = RangeQuery::partition(event_tag_partition_key(&input.account_id))
        .between(event_tag_sort_key(tag, from), event_tag_sort_key(tag, to))
        .descending()
        .limit(limit)
        .start_after(start_key);
    let page = store.query(&query).await?;

    // a value containing `#DATE#` sorts inside another tag's range
    let mut event_keys = Vec::with_capacity(page.items.len());
    for item in &page.items {
        let event_tag = EventTag::from_item(item)?;
        if event_tag.value == tag {
            event_keys.push(event_tag.event_key());
        } else {
            debug!(value = %event_tag.value, "Skipping join record of another tag");
        }
    }
    info!(count = event_keys.len(), "Found events with matching tag");

    let mut found: HashMap<Key, Event> = HashMap::with_capacity(event_keys.len());
    if !event_keys.is_empty() {
        for item in store.batch_get(&event_keys).await? {
            let event = Event::from_item(&item)?;
            found.insert(event.key(), event);
        }
    }

    // batch get order is arbitrary, restore the join records' order
    let mut items = Vec::with_capacity(event_keys.len());
    for key in &event_keys {
        match found.remove(key) {
            Some(event) => items.push(event),
            None => debug!(sort_key = %key.sort_key, "Skipping tag of deleted event"),
        }
    }

    Ok(EventPage {
        items,
        pagination_token: cursor::encode(page.last_evaluated_key.as_ref())?,
    })
}
