//! Shared utilities for integration tests.
//!
//! Builds use cases over a fresh in-memory store and callers with the usual
//! scopes.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use tagtrail::identity::Identity;
use tagtrail::models::{CreateEventRequest, EventDto};
use tagtrail::services::Services;
use tagtrail::storage::MockStore;

pub const ALICE: &str = "auth0|alice";
pub const BOB: &str = "auth0|bob";

/// Use cases and the store behind them, for inspecting writes.
pub struct Harness {
    pub store: Arc<MockStore>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MockStore::new());
        let services = Services::new(store.clone());
        Self { store, services }
    }

    pub async fn create_event(
        &self,
        account_id: &str,
        title: &str,
        date: DateTime<Utc>,
        tags: &[&str],
    ) -> EventDto {
        self.services
            .events
            .create(
                &event_caller(),
                CreateEventRequest {
                    account_id: Some(account_id.to_string()),
                    title: Some(title.to_string()),
                    date: Some(date),
                    tags: Some(tags.iter().map(|t| t.to_string()).collect()),
                    ..Default::default()
                },
            )
            .await
            .expect("event should be created")
    }
}

/// Caller holding every scope.
pub fn caller(subject: &str) -> Identity {
    Identity::new(subject, format!("{}@example.test", subject.trim_start_matches("auth0|")))
        .with_scope_claim("account event")
}

pub fn event_caller() -> Identity {
    caller(ALICE)
}

/// Caller with a valid identity but no scopes.
pub fn unscoped_caller() -> Identity {
    Identity::new(ALICE, "alice@example.test")
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}
