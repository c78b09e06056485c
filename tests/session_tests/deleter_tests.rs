//! Tests for Deleter
//!
//! These tests verify:
//! - Deleted ids never reappear in pages
//! - Deleting unknown or zero ids succeeds
//! - Only-meta deletes keep payloads

use std::sync::Arc;

use pagekv::{impl_taggable, Collection, Context, MemoryStore, PageError};
use serde::{Deserialize, Serialize};

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Post {
    id: String,
    score: i64,
}

impl_taggable!(Post, id = id, score = score);

fn setup() -> (Arc<MemoryStore>, Collection) {
    let store = Arc::new(MemoryStore::new());
    let feed = Collection::open(store.clone(), "feed").unwrap();
    let posts: Vec<Post> = ["a", "b", "c", "d"]
        .iter()
        .zip(1..)
        .map(|(id, score)| Post {
            id: id.to_string(),
            score,
        })
        .collect();
    feed.write().values(&posts).exec().unwrap();
    (store, feed)
}

fn all_ids(feed: &Collection) -> Vec<String> {
    feed.read()
        .page(100)
        .exec()
        .unwrap()
        .iter()
        .map(|item| item.id().to_string())
        .collect()
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_deleted_ids_disappear() {
    let (_store, feed) = setup();

    feed.delete(["b", "d"]).exec().unwrap();

    assert_eq!(all_ids(&feed), ["a", "c"]);
    let items = feed.read().ids(["b"]).exec().unwrap();
    assert_eq!(items[0].error(), Some(&PageError::Nil));
}

#[test]
fn test_delete_unknown_id_is_ok() {
    let (_store, feed) = setup();
    feed.delete(["never"]).exec().unwrap();
    assert_eq!(all_ids(&feed).len(), 4);
}

#[test]
fn test_delete_nothing_skips_store() {
    let (_store, feed) = setup();

    let ctx = Context::background();
    ctx.cancel();
    // no round trip, so the cancelled context is never consulted
    feed.delete(Vec::<String>::new()).with(ctx).exec().unwrap();
}

#[test]
fn test_only_meta_delete_keeps_payload() {
    let (_store, feed) = setup();

    feed.delete(["a"]).only_meta().exec().unwrap();

    assert_eq!(all_ids(&feed), ["b", "c", "d"]);
    let items = feed.read().ids(["a"]).exec().unwrap();
    assert_eq!(items[0].scan::<Post>().unwrap().score, 1);
}

#[test]
fn test_deleted_cursor_is_not_found() {
    let (_store, feed) = setup();
    feed.delete(["b"]).exec().unwrap();

    let err = feed.read().page(1).after("b").exec().unwrap_err();
    assert!(matches!(err, PageError::CursorNotFound(_)));
}

#[test]
fn test_delete_everything_removes_keys() {
    let (store, feed) = setup();
    feed.delete(["a", "b", "c", "d"]).exec().unwrap();
    assert_eq!(store.key_count(), 0);
    assert_eq!(feed.count(&Context::background()).unwrap(), 0);
}
