//! Tests for retention eviction
//!
//! These tests verify:
//! - Ascending collections drop the highest ranks, descending the lowest
//! - At most one pass per interval
//! - The flag lives for exactly one interval
//! - Non-positive caps drop the whole index, payloads are left to expire
//! - Failures are logged, never surfaced

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pagekv::operator::RETENTION_FLAG;
use pagekv::store::{Command, MemoryStore, Reply, Store};
use pagekv::{
    impl_taggable, Collection, CollectionConfig, Context, FailureLogger, PageError,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Helper Functions
// =============================================================================

const INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Post {
    id: String,
    score: i64,
}

impl_taggable!(Post, id = id, score = score);

#[derive(Debug, Default)]
struct RecordingLogger {
    messages: Mutex<Vec<String>>,
}

impl FailureLogger for RecordingLogger {
    fn error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

fn posts(range: std::ops::Range<i64>) -> Vec<Post> {
    range
        .map(|i| Post {
            id: format!("p{:03}", i),
            score: i,
        })
        .collect()
}

fn setup(max_entries: i64, descending: bool) -> (Arc<MemoryStore>, Collection) {
    let store = Arc::new(MemoryStore::new());
    let mut builder = CollectionConfig::builder()
        .index_key("feed")
        .retention(max_entries, INTERVAL);
    if descending {
        builder = builder.descending();
    }
    let feed = Collection::new(store.clone(), builder.build().unwrap()).unwrap();
    (store, feed)
}

fn count(feed: &Collection) -> i64 {
    feed.count(&Context::background()).unwrap()
}

fn page_ids(feed: &Collection) -> Vec<String> {
    feed.read()
        .page(100)
        .only_meta()
        .exec()
        .unwrap()
        .iter()
        .map(|item| item.id().to_string())
        .collect()
}

// =============================================================================
// Trimming Tests
// =============================================================================

#[test]
fn test_ascending_keeps_lowest_ranks() {
    let (store, feed) = setup(3, false);
    feed.write().values(&posts(0..5)).exec().unwrap();
    assert_eq!(count(&feed), 5);

    store.advance(INTERVAL + Duration::from_secs(1));
    feed.write().exec().unwrap();

    assert_eq!(count(&feed), 3);
    assert_eq!(page_ids(&feed), ["p000", "p001", "p002"]);
}

#[test]
fn test_descending_keeps_highest_scores() {
    let (store, feed) = setup(3, true);
    feed.write().values(&posts(0..5)).exec().unwrap();

    store.advance(INTERVAL + Duration::from_secs(1));
    feed.write().exec().unwrap();

    assert_eq!(page_ids(&feed), ["p004", "p003", "p002"]);
}

#[test]
fn test_trim_runs_before_the_write() {
    let (store, feed) = setup(3, false);
    feed.write().values(&posts(0..5)).exec().unwrap();

    store.advance(INTERVAL + Duration::from_secs(1));
    feed.write().values(&posts(10..11)).exec().unwrap();

    assert_eq!(page_ids(&feed), ["p000", "p001", "p002", "p010"]);
}

#[test]
fn test_under_cap_is_untouched() {
    let (store, feed) = setup(10, false);
    feed.write().values(&posts(0..5)).exec().unwrap();

    store.advance(INTERVAL + Duration::from_secs(1));
    feed.write().exec().unwrap();

    assert_eq!(count(&feed), 5);
}

#[test]
fn test_non_positive_cap_drops_index_but_not_payloads() {
    let (store, feed) = setup(0, false);
    feed.write().values(&posts(0..3)).exec().unwrap();

    store.advance(INTERVAL + Duration::from_secs(1));
    feed.write().exec().unwrap();

    assert_eq!(count(&feed), 0);
    assert!(feed.read().page(10).exec().unwrap().is_empty());

    // payloads were written with the default five minute expiry
    let items = feed.read().ids(["p000", "p002"]).exec().unwrap();
    assert!(items.iter().all(|item| item.is_ok()));
}

// =============================================================================
// Debounce Tests
// =============================================================================

#[test]
fn test_at_most_one_pass_per_interval() {
    let (store, feed) = setup(3, false);

    // the first write finds no flag, trims nothing and sets it
    feed.write().values(&posts(0..5)).exec().unwrap();
    feed.write().values(&posts(5..8)).exec().unwrap();
    assert_eq!(count(&feed), 8);

    store.advance(INTERVAL + Duration::from_secs(1));
    feed.write().exec().unwrap();
    assert_eq!(count(&feed), 3);

    // flag is fresh again: no second pass within this interval
    feed.write().values(&posts(8..12)).exec().unwrap();
    store.advance(INTERVAL / 2);
    feed.write().exec().unwrap();
    assert_eq!(count(&feed), 7);
}

#[test]
fn test_flag_lives_one_interval() {
    let (store, feed) = setup(3, false);
    feed.write().exec().unwrap();

    let flag = format!("{}:feed", RETENTION_FLAG);
    let ttl = store.ttl(&flag).unwrap();
    assert!(ttl <= INTERVAL && ttl > INTERVAL - Duration::from_secs(5));

    store.advance(INTERVAL);
    assert_eq!(store.ttl(&flag), None);
}

#[test]
fn test_disabled_retention_sets_no_flag() {
    let store = Arc::new(MemoryStore::new());
    let feed = Collection::open(store.clone(), "feed").unwrap();
    feed.write().values(&posts(0..2)).exec().unwrap();

    // index + two payloads
    assert_eq!(store.key_count(), 3);
}

// =============================================================================
// Failure Tests
// =============================================================================

/// Store whose ZCARD always fails
struct NoCardStore {
    inner: MemoryStore,
}

impl Store for NoCardStore {
    fn pipeline(&self, ctx: &Context, commands: Vec<Command>) -> pagekv::Result<Vec<pagekv::Result<Reply>>> {
        if commands.iter().any(|c| matches!(c, Command::ZCard { .. })) {
            return Err(PageError::Store("ZCARD unavailable".to_string()));
        }
        self.inner.pipeline(ctx, commands)
    }

    fn transaction(&self, ctx: &Context, commands: Vec<Command>) -> pagekv::Result<Vec<Reply>> {
        self.inner.transaction(ctx, commands)
    }
}

#[test]
fn test_retention_failure_is_logged_not_surfaced() {
    let logger = Arc::new(RecordingLogger::default());
    let config = CollectionConfig::builder()
        .index_key("feed")
        .retention(3, INTERVAL)
        .logger(logger.clone())
        .build()
        .unwrap();
    let store = Arc::new(NoCardStore {
        inner: MemoryStore::new(),
    });
    let feed = Collection::new(store.clone(), config).unwrap();

    feed.write().values(&posts(0..2)).exec().unwrap();

    let messages = logger.messages.lock();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("failed to retention on feed"));
    assert!(messages[0].contains("ZCARD unavailable"));

    // the flag is still set, so the next write does not retry
    drop(messages);
    feed.write().values(&posts(2..3)).exec().unwrap();
    assert_eq!(logger.messages.lock().len(), 1);

    let items = feed.read().ids(["p000", "p002"]).exec().unwrap();
    assert!(items.iter().all(|item| item.is_ok()));
}
