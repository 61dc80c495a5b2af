//! Event use-case tests over the in-memory store.
//!
//! Run with: cargo test --test events

mod common;

use chrono::Utc;

use common::{at, event_caller, unscoped_caller, Harness};
use tagtrail::composite_id;
use tagtrail::keys::{event_partition_key, format_date, EventTag, Record, Tag};
use tagtrail::models::EditEventRequest;
use tagtrail::query::{self, ListEventsInput};
use tagtrail::services::ServiceError;

fn tag_key(account_id: &str, value: &str) -> tagtrail::storage::Key {
    Tag {
        account_id: account_id.to_string(),
        value: value.to_string(),
    }
    .key()
}

fn event_tag_key(
    account_id: &str,
    value: &str,
    date: chrono::DateTime<Utc>,
) -> tagtrail::storage::Key {
    EventTag {
        account_id: account_id.to_string(),
        value: value.to_string(),
        date,
    }
    .key()
}

fn listing(account_id: &str, limit: i32) -> ListEventsInput {
    ListEventsInput {
        account_id: account_id.to_string(),
        from_date: Some(at(1, 0)),
        to_date: Some(at(31, 0)),
        limit,
        ..Default::default()
    }
}

async fn tag_values(harness: &Harness, account_id: &str) -> Vec<String> {
    let mut values: Vec<String> = harness
        .services
        .tags
        .list(&event_caller(), Some(account_id))
        .await
        .expect("tags should list")
        .into_iter()
        .map(|tag| tag.value)
        .collect();
    values.sort();
    values
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_event_writes_tag_records() {
    let harness = Harness::new();

    let event = harness
        .create_event("acme", "Deploy", at(1, 10), &["deploy", "prod", "deploy"])
        .await;

    assert_eq!(event.tags, ["deploy", "prod"]);
    assert_eq!(event.account_id, "acme");
    for tag in ["deploy", "prod"] {
        assert!(harness.store.contains(&tag_key("acme", tag)).await);
        assert!(harness.store.contains(&event_tag_key("acme", tag, at(1, 10))).await);
    }
}

#[tokio::test]
async fn test_tag_vocabulary_is_idempotent() {
    let harness = Harness::new();

    harness.create_event("acme", "One", at(1, 10), &["deploy"]).await;
    harness.create_event("acme", "Two", at(2, 10), &["deploy"]).await;

    assert_eq!(tag_values(&harness, "acme").await, ["deploy"]);
}

#[tokio::test]
async fn test_create_event_truncates_date_to_millis() {
    let harness = Harness::new();
    let date = at(1, 10) + chrono::Duration::nanoseconds(1_234_567);

    let event = harness.create_event("acme", "Deploy", date, &[]).await;

    assert_eq!(format_date(event.date), "2024-05-01T10:00:00.001Z");
    let (_, sort_key) = composite_id::decode(&event.id).unwrap();
    assert_eq!(sort_key, "2024-05-01T10:00:00.001Z");
}

#[tokio::test]
async fn test_create_event_requires_account_and_title() {
    let harness = Harness::new();

    let err = harness
        .services
        .events
        .create(&event_caller(), Default::default())
        .await
        .unwrap_err();

    match err {
        ServiceError::Validation(errors) => {
            let names: Vec<_> = errors.iter().map(|e| e.property_name.as_str()).collect();
            assert_eq!(names, ["AccountId", "Title"]);
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
    assert_eq!(harness.store.write_count(), 0);
}

#[tokio::test]
async fn test_create_event_requires_event_scope() {
    let harness = Harness::new();

    let err = harness
        .services
        .events
        .create(&unscoped_caller(), Default::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Unauthorized(_)));
    assert_eq!(err.status_code(), 401);
}

// ============================================================================
// Edit
// ============================================================================

#[tokio::test]
async fn test_edit_event_replaces_tags() {
    let harness = Harness::new();
    let event = harness
        .create_event("acme", "Deploy", at(1, 10), &["a", "b"])
        .await;

    let edited = harness
        .services
        .events
        .edit(
            &event_caller(),
            EditEventRequest {
                id: Some(event.id.clone()),
                title: Some("Deploy v2".into()),
                description: Some("rolled forward".into()),
                tags: Some(vec!["b".into(), "c".into()]),
            },
        )
        .await
        .expect("edit should succeed");

    assert_eq!(edited.id, event.id, "keys never change on edit");
    assert_eq!(edited.title, "Deploy v2");
    assert_eq!(edited.tags, ["b", "c"]);

    assert!(!harness.store.contains(&event_tag_key("acme", "a", at(1, 10))).await);
    assert!(harness.store.contains(&event_tag_key("acme", "b", at(1, 10))).await);
    assert!(harness.store.contains(&event_tag_key("acme", "c", at(1, 10))).await);
    assert_eq!(
        tag_values(&harness, "acme").await,
        ["a", "b", "c"],
        "vocabulary keeps removed tags"
    );
}

#[tokio::test]
async fn test_edit_absent_event_writes_from_empty_state() {
    let harness = Harness::new();
    let id = composite_id::encode(&event_partition_key("acme"), "2024-05-03T08:00:00.000Z");

    let edited = harness
        .services
        .events
        .edit(
            &event_caller(),
            EditEventRequest {
                id: Some(id.clone()),
                title: Some("Recovered".into()),
                tags: Some(vec!["ops".into()]),
                ..Default::default()
            },
        )
        .await
        .expect("edit should succeed");

    assert_eq!(edited.account_id, "acme");
    assert_eq!(edited.date, at(3, 8));
    let page = harness
        .services
        .events
        .list(&event_caller(), &listing("acme", 10))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Recovered");
}

#[tokio::test]
async fn test_edit_rejects_non_event_id() {
    let harness = Harness::new();
    let id = composite_id::encode("ACCOUNT#acme", "#");

    let err = harness
        .services
        .events
        .edit(
            &event_caller(),
            EditEventRequest {
                id: Some(id),
                title: Some("Nope".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidRequest));
    assert_eq!(harness.store.write_count(), 0);
}

#[tokio::test]
async fn test_edit_rejects_non_canonical_date_spelling() {
    let harness = Harness::new();
    let event = harness.create_event("acme", "Deploy", at(1, 10), &["a"]).await;
    let writes = harness.store.write_count();
    let id = composite_id::encode(&event_partition_key("acme"), "2024-05-01T10:00:00Z");

    let err = harness
        .services
        .events
        .edit(
            &event_caller(),
            EditEventRequest {
                id: Some(id),
                title: Some("X".into()),
                tags: Some(vec!["b".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidRequest));
    assert_eq!(harness.store.write_count(), writes);
    assert!(harness.store.contains(&event_tag_key("acme", "a", at(1, 10))).await);

    let stored = harness
        .services
        .events
        .list(&event_caller(), &listing("acme", 10))
        .await
        .unwrap();
    assert_eq!(stored.items[0].id, event.id);
    assert_eq!(stored.items[0].title, "Deploy");
    assert_eq!(stored.items[0].tags, ["a"]);
}

#[tokio::test]
async fn test_delete_rejects_non_canonical_date_spelling() {
    let harness = Harness::new();
    harness.create_event("acme", "Deploy", at(1, 10), &["a"]).await;
    let writes = harness.store.write_count();
    let id = composite_id::encode(&event_partition_key("acme"), "2024-05-01T12:00:00+02:00");

    let err = harness
        .services
        .events
        .delete(&event_caller(), Some(&id))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidRequest));
    assert_eq!(harness.store.write_count(), writes);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_event_removes_join_records() {
    let harness = Harness::new();
    let event = harness
        .create_event("acme", "Deploy", at(1, 10), &["deploy"])
        .await;

    harness
        .services
        .events
        .delete(&event_caller(), Some(&event.id))
        .await
        .expect("delete should succeed");

    let key = composite_id::decode_key(&event.id).unwrap();
    assert!(!harness.store.contains(&key).await);
    assert!(!harness.store.contains(&event_tag_key("acme", "deploy", at(1, 10))).await);
    assert!(harness.store.contains(&tag_key("acme", "deploy")).await);
}

#[tokio::test]
async fn test_delete_malformed_id_writes_nothing() {
    let harness = Harness::new();
    harness.create_event("acme", "Deploy", at(1, 10), &["deploy"]).await;
    let writes = harness.store.write_count();
    let bad_date = composite_id::encode(&event_partition_key("acme"), "yesterday");
    let not_event = composite_id::encode("ACCOUNT#acme", "#");

    for id in [
        None,
        Some(""),
        Some("not-an-id"),
        Some("bm8tc2VwYXJhdG9y"),
        Some(bad_date.as_str()),
        Some(not_event.as_str()),
    ] {
        let err = harness
            .services
            .events
            .delete(&event_caller(), id)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ServiceError::InvalidRequest),
            "id {:?} should be rejected",
            id
        );
    }

    assert_eq!(harness.store.write_count(), writes);
}

#[tokio::test]
async fn test_delete_absent_event_is_noop() {
    let harness = Harness::new();
    let id = composite_id::encode(&event_partition_key("acme"), "2024-05-03T08:00:00.000Z");

    harness
        .services
        .events
        .delete(&event_caller(), Some(&id))
        .await
        .expect("deleting an absent event should succeed");

    assert_eq!(harness.store.write_count(), 0);
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_list_defaults_to_the_day_of_now() {
    let harness = Harness::new();
    let now = at(15, 9);
    harness.create_event("acme", "Today", now, &[]).await;
    harness
        .create_event("acme", "Last week", now - chrono::Duration::days(7), &[])
        .await;

    let page = query::list_events(
        harness.store.as_ref(),
        &ListEventsInput {
            account_id: "acme".into(),
            limit: 10,
            ..Default::default()
        },
        now,
    )
    .await
    .unwrap();

    let titles: Vec<_> = page.items.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Today"]);
}

#[tokio::test]
async fn test_list_pages_newest_first() {
    let harness = Harness::new();
    for day in 1..=3 {
        harness
            .create_event("acme", &format!("Day {}", day), at(day, 10), &[])
            .await;
    }

    let mut titles = Vec::new();
    let mut input = listing("acme", 2);
    loop {
        let page = harness
            .services
            .events
            .list(&event_caller(), &input)
            .await
            .unwrap();
        titles.extend(page.items.into_iter().map(|e| e.title));
        match page.pagination_token {
            Some(token) => input.pagination_token = Some(token),
            None => break,
        }
    }

    assert_eq!(titles, ["Day 3", "Day 2", "Day 1"]);
}

#[tokio::test]
async fn test_list_by_tag() {
    let harness = Harness::new();
    harness.create_event("acme", "Deploy", at(1, 10), &["deploy", "prod"]).await;
    harness.create_event("acme", "Incident", at(2, 10), &["incident"]).await;
    harness.create_event("acme", "Rollback", at(3, 10), &["deploy"]).await;
    harness.create_event("other", "Elsewhere", at(2, 10), &["deploy"]).await;

    let page = harness
        .services
        .events
        .list(
            &event_caller(),
            &ListEventsInput {
                tag: Some("deploy".into()),
                ..listing("acme", 10)
            },
        )
        .await
        .unwrap();

    let titles: Vec<_> = page.items.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Rollback", "Deploy"]);
    assert_eq!(page.items[1].tags, ["deploy", "prod"]);
}

#[tokio::test]
async fn test_list_rejects_bad_limit() {
    let harness = Harness::new();

    let err = harness
        .services
        .events
        .list(&event_caller(), &listing("acme", 0))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    let errors = err.field_errors().unwrap();
    assert_eq!(errors[0].property_name, "Limit");
}
