//! Event use cases.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::{check, require_scope, Result, ServiceError};
use crate::composite_id;
use crate::fanout;
use crate::identity::{Identity, EVENT_SCOPE};
use crate::keys::{key_precision, Event, Record};
use crate::models::{CreateEventRequest, EditEventRequest, EventDto, ListEventsResult};
use crate::query::{self, ListEventsInput};
use crate::storage::{Key, Store};
use crate::validation;

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
}

/// Resolve an opaque id to the key of an Event record.
///
/// The sort key must be in stored form. Another spelling of the same instant
/// would name a different record than the one it resolves to.
fn event_key(id: &str) -> Result<Key> {
    let key = composite_id::decode_key(id).ok_or(ServiceError::InvalidRequest)?;
    let event = Event::from_key(&key).map_err(|_| ServiceError::InvalidRequest)?;
    if event.key() != key {
        return Err(ServiceError::InvalidRequest);
    }
    Ok(key)
}

impl EventService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an event and fan out its tags.
    ///
    /// The date defaults to now and is stored at millisecond precision.
    pub async fn create(
        &self,
        identity: &Identity,
        request: CreateEventRequest,
    ) -> Result<EventDto> {
        require_scope(identity, EVENT_SCOPE)?;

        let mut errors = Vec::new();
        validation::require(&mut errors, "AccountId", request.account_id.as_deref());
        validation::require(&mut errors, "Title", request.title.as_deref());
        check(errors)?;

        info!("Attempting to create event");

        let event = Event {
            account_id: request.account_id.unwrap_or_default(),
            date: key_precision(request.date.unwrap_or_else(Utc::now)),
            title: request.title.unwrap_or_default(),
            description: request.description,
            tags: fanout::distinct(&request.tags.unwrap_or_default()),
        };
        self.store.put(event.to_item()).await?;
        info!(account_id = %event.account_id, "Event created");

        fanout::create(self.store.as_ref(), &event.account_id, event.date, &event.tags).await?;

        Ok(EventDto::from(&event))
    }

    /// Replace an event's title, description and tags. Keys never change.
    ///
    /// An id that decodes but names no stored event is edited from an empty
    /// base state.
    pub async fn edit(&self, identity: &Identity, request: EditEventRequest) -> Result<EventDto> {
        require_scope(identity, EVENT_SCOPE)?;

        let mut errors = Vec::new();
        validation::require(&mut errors, "Id", request.id.as_deref());
        validation::require(&mut errors, "Title", request.title.as_deref());
        check(errors)?;

        let key = event_key(request.id.as_deref().unwrap_or_default())?;

        info!(sort_key = %key.sort_key, "Attempting to edit event");

        let existing = match self.store.get(&key).await? {
            Some(item) => Event::from_item(&item)?,
            None => {
                debug!(partition = %key.partition_key, "Editing event with no stored record");
                Event::from_key(&key)?
            }
        };
        let old_tags = existing.tags.clone();

        let event = Event {
            title: request.title.unwrap_or_default(),
            description: request.description,
            tags: fanout::distinct(&request.tags.unwrap_or_default()),
            ..existing
        };
        self.store.put(event.to_item()).await?;
        info!(account_id = %event.account_id, "Event edited");

        fanout::update(
            self.store.as_ref(),
            &event.account_id,
            event.date,
            &old_tags,
            &event.tags,
        )
        .await?;

        Ok(EventDto::from(&event))
    }

    /// Delete an event and its tag join records.
    ///
    /// Deleting an event that no longer exists succeeds without writing.
    pub async fn delete(&self, identity: &Identity, id: Option<&str>) -> Result<()> {
        require_scope(identity, EVENT_SCOPE)?;

        let id = id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ServiceError::InvalidRequest)?;
        let key = event_key(id)?;

        info!(sort_key = %key.sort_key, "Attempting to delete event");

        let Some(item) = self.store.get(&key).await? else {
            info!(partition = %key.partition_key, "Event already absent");
            return Ok(());
        };
        let event = Event::from_item(&item)?;

        self.store.delete(&key).await?;
        fanout::delete(self.store.as_ref(), &event.account_id, event.date, &event.tags).await?;
        info!(account_id = %event.account_id, "Event deleted");

        Ok(())
    }

    /// One page of an account's events, newest first.
    pub async fn list(
        &self,
        identity: &Identity,
        input: &ListEventsInput,
    ) -> Result<ListEventsResult> {
        require_scope(identity, EVENT_SCOPE)?;

        let page = query::list_events(self.store.as_ref(), input, Utc::now()).await?;

        Ok(ListEventsResult {
            pagination_token: page.pagination_token,
            items: page.items.iter().map(EventDto::from).collect(),
        })
    }
}
