//! Store interface tests.
//!
//! These tests verify the contract of the Store trait.
//! Each storage implementation should run these tests. Keys are unique per
//! run so the tests can share a table with other data.

use tagtrail::storage::{AttributeValue, Item, Key, RangeQuery, Store, WriteRequest};

fn unique(name: &str) -> String {
    format!("test_{}_{}", name, uuid::Uuid::new_v4().simple())
}

fn item(pk: &str, sk: &str) -> Item {
    Key::new(pk, sk).to_item()
}

fn with_attr(mut item: Item, name: &str, value: &str) -> Item {
    item.insert(name.to_string(), AttributeValue::S(value.to_string()));
    item
}

fn sort_keys(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(|item| Key::of(item).expect("item has key").sort_key)
        .collect()
}

// =============================================================================
// Store::get / put / delete tests
// =============================================================================

pub async fn test_get_nonexistent<S: Store>(store: &S) {
    let result = store
        .get(&Key::new(unique("get"), "#"))
        .await
        .expect("get should succeed");
    assert!(result.is_none(), "nonexistent item should be None");
}

pub async fn test_put_and_get<S: Store>(store: &S) {
    let pk = unique("put_get");
    let stored = with_attr(item(&pk, "#"), "Name", "Acme");

    store.put(stored.clone()).await.expect("put should succeed");

    let result = store
        .get(&Key::new(&pk, "#"))
        .await
        .expect("get should succeed")
        .expect("item should exist");
    assert_eq!(result, stored, "should return stored item");
}

pub async fn test_put_replaces<S: Store>(store: &S) {
    let pk = unique("put_replace");
    store
        .put(with_attr(item(&pk, "#"), "Name", "Old"))
        .await
        .unwrap();
    store.put(item(&pk, "#")).await.unwrap();

    let result = store.get(&Key::new(&pk, "#")).await.unwrap().unwrap();
    assert!(
        !result.contains_key("Name"),
        "put should replace the whole item, not merge"
    );
}

pub async fn test_string_set_round_trip<S: Store>(store: &S) {
    let pk = unique("string_set");
    let mut stored = item(&pk, "2024-05-01T10:30:00.000Z");
    stored.insert(
        "Tags".to_string(),
        AttributeValue::Ss(vec!["deploy".into(), "prod".into()]),
    );
    store.put(stored).await.unwrap();

    let result = store
        .get(&Key::new(&pk, "2024-05-01T10:30:00.000Z"))
        .await
        .unwrap()
        .unwrap();
    let mut tags = result
        .get("Tags")
        .and_then(AttributeValue::as_ss)
        .expect("tags should be a string set")
        .to_vec();
    tags.sort();
    assert_eq!(tags, ["deploy", "prod"]);
}

pub async fn test_put_if_absent<S: Store>(store: &S) {
    let pk = unique("put_if_absent");

    let created = store
        .put_if_absent(with_attr(item(&pk, "#"), "Name", "First"))
        .await
        .expect("conditional put should succeed");
    assert!(created, "first conditional put should create");

    let created = store
        .put_if_absent(with_attr(item(&pk, "#"), "Name", "Second"))
        .await
        .expect("conditional put should succeed");
    assert!(!created, "second conditional put should be rejected");

    let result = store.get(&Key::new(&pk, "#")).await.unwrap().unwrap();
    assert_eq!(result.get("Name").and_then(AttributeValue::as_s), Some("First"));
}

pub async fn test_delete<S: Store>(store: &S) {
    let pk = unique("delete");
    store.put(item(&pk, "#")).await.unwrap();

    store
        .delete(&Key::new(&pk, "#"))
        .await
        .expect("delete should succeed");
    assert!(store.get(&Key::new(&pk, "#")).await.unwrap().is_none());

    store
        .delete(&Key::new(&pk, "#"))
        .await
        .expect("deleting an absent key should succeed");
}

// =============================================================================
// Store::query tests
// =============================================================================

pub async fn test_query_empty_partition<S: Store>(store: &S) {
    let page = store
        .query(&RangeQuery::partition(unique("query_empty")))
        .await
        .expect("query should succeed");
    assert!(page.items.is_empty());
    assert!(page.last_evaluated_key.is_none());
}

pub async fn test_query_between_is_inclusive<S: Store>(store: &S) {
    let pk = unique("query_between");
    for sk in ["a", "b", "c", "d", "e"] {
        store.put(item(&pk, sk)).await.unwrap();
    }

    let page = store
        .query(&RangeQuery::partition(&pk).between("b", "d"))
        .await
        .unwrap();
    assert_eq!(sort_keys(&page.items), ["b", "c", "d"]);

    let page = store
        .query(&RangeQuery::partition(&pk).between("b", "d").descending())
        .await
        .unwrap();
    assert_eq!(sort_keys(&page.items), ["d", "c", "b"]);
}

pub async fn test_query_begins_with<S: Store>(store: &S) {
    let pk = unique("query_prefix");
    for sk in ["#TAG#a#DATE#1", "#TAG#ab#DATE#1", "#TAG#b#DATE#1"] {
        store.put(item(&pk, sk)).await.unwrap();
    }

    let mut query = RangeQuery::partition(&pk);
    query.sort_key = tagtrail::storage::SortKeyCondition::BeginsWith("#TAG#a".into());
    let page = store.query(&query).await.unwrap();
    assert_eq!(sort_keys(&page.items), ["#TAG#a#DATE#1", "#TAG#ab#DATE#1"]);
}

pub async fn test_query_pagination<S: Store>(store: &S) {
    let pk = unique("query_pages");
    for sk in ["1", "2", "3"] {
        store.put(item(&pk, sk)).await.unwrap();
    }

    let mut seen = Vec::new();
    let mut start = None;
    for _ in 0..4 {
        let page = store
            .query(
                &RangeQuery::partition(&pk)
                    .descending()
                    .limit(2)
                    .start_after(start.take()),
            )
            .await
            .unwrap();
        seen.extend(sort_keys(&page.items));
        match page.last_evaluated_key {
            Some(key) => start = Some(key),
            None => break,
        }
    }
    assert_eq!(seen, ["3", "2", "1"], "pages should cover every item once");
}

pub async fn test_partition_isolation<S: Store>(store: &S) {
    let pk_a = unique("isolation_a");
    let pk_b = unique("isolation_b");
    store.put(item(&pk_a, "1")).await.unwrap();
    store.put(item(&pk_b, "1")).await.unwrap();

    let page = store.query(&RangeQuery::partition(&pk_a)).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(Key::of(&page.items[0]).unwrap().partition_key, pk_a);
}

// =============================================================================
// Store::query_subject_index tests
// =============================================================================

pub async fn test_subject_index<S: Store>(store: &S) {
    let subject = unique("subject");
    let mine_a = format!("MEMBER#{}", unique("a"));
    let mine_b = format!("MEMBER#{}", unique("b"));
    let theirs = format!("MEMBER#{}", unique("c"));
    let not_member = format!("OTHER#{}", unique("d"));

    store
        .put(with_attr(item(&mine_a, "#ROLE#Owner#USER#x"), "Subject", &subject))
        .await
        .unwrap();
    store
        .put(with_attr(item(&mine_b, "#ROLE#Owner#USER#x"), "Subject", &subject))
        .await
        .unwrap();
    store
        .put(with_attr(item(&theirs, "#ROLE#Owner#USER#y"), "Subject", "someone-else"))
        .await
        .unwrap();
    store
        .put(with_attr(item(&not_member, "#"), "Subject", &subject))
        .await
        .unwrap();

    let items = store
        .query_subject_index(&subject, "MEMBER#")
        .await
        .expect("index query should succeed");
    let mut partitions: Vec<String> = items
        .iter()
        .map(|item| Key::of(item).unwrap().partition_key)
        .collect();
    partitions.sort();
    let mut expected = vec![mine_a, mine_b];
    expected.sort();
    assert_eq!(partitions, expected);
}

// =============================================================================
// Store::batch_get / batch_write tests
// =============================================================================

pub async fn test_batch_get_omits_missing<S: Store>(store: &S) {
    let pk = unique("batch_get");
    store.put(item(&pk, "1")).await.unwrap();
    store.put(item(&pk, "3")).await.unwrap();

    let keys = [
        Key::new(&pk, "1"),
        Key::new(&pk, "2"),
        Key::new(&pk, "3"),
    ];
    let items = store.batch_get(&keys).await.expect("batch get should succeed");
    let mut found = sort_keys(&items);
    found.sort();
    assert_eq!(found, ["1", "3"]);
}

pub async fn test_batch_write_beyond_chunk_size<S: Store>(store: &S) {
    let pk = unique("batch_write");
    let puts = (0..30)
        .map(|i| WriteRequest::Put(item(&pk, &format!("{:03}", i))))
        .collect();
    store
        .batch_write(puts)
        .await
        .expect("batch write should succeed");

    let page = store.query(&RangeQuery::partition(&pk)).await.unwrap();
    assert_eq!(page.items.len(), 30);

    let deletes = (0..30)
        .map(|i| WriteRequest::Delete(Key::new(&pk, format!("{:03}", i))))
        .collect();
    store.batch_write(deletes).await.unwrap();

    let page = store.query(&RangeQuery::partition(&pk)).await.unwrap();
    assert!(page.items.is_empty());
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all Store interface tests against a store implementation.
#[macro_export]
macro_rules! run_store_tests {
    ($store:expr) => {
        use $crate::storage::store_tests::*;

        // get / put / delete tests
        test_get_nonexistent($store).await;
        println!("  test_get_nonexistent: PASSED");

        test_put_and_get($store).await;
        println!("  test_put_and_get: PASSED");

        test_put_replaces($store).await;
        println!("  test_put_replaces: PASSED");

        test_string_set_round_trip($store).await;
        println!("  test_string_set_round_trip: PASSED");

        test_put_if_absent($store).await;
        println!("  test_put_if_absent: PASSED");

        test_delete($store).await;
        println!("  test_delete: PASSED");

        // query tests
        test_query_empty_partition($store).await;
        println!("  test_query_empty_partition: PASSED");

        test_query_between_is_inclusive($store).await;
        println!("  test_query_between_is_inclusive: PASSED");

        test_query_begins_with($store).await;
        println!("  test_query_begins_with: PASSED");

        test_query_pagination($store).await;
        println!("  test_query_pagination: PASSED");

        test_partition_isolation($store).await;
        println!("  test_partition_isolation: PASSED");

        // index tests
        test_subject_index($store).await;
        println!("  test_subject_index: PASSED");

        // batch tests
        test_batch_get_omits_missing($store).await;
        println!("  test_batch_get_omits_missing: PASSED");

        test_batch_write_beyond_chunk_size($store).await;
        println!("  test_batch_write_beyond_chunk_size: PASSED");
    };
}
