//! Tests for Operator
//!
//! These tests verify:
//! - Batch reads suppress nil outcomes but abort on other failures
//! - Transport failures surface from reads, writes and deletes
//! - Cursor resolution per order
//! - Transactions are queued as one atomic batch

use std::sync::Arc;

use parking_lot::Mutex;
use pagekv::operator::Operator;
use pagekv::store::{Command, MemoryStore, Reply, Store, Transaction};
use pagekv::{impl_taggable, Collection, Context, Order, PageError, Record};
use serde::Serialize;

// =============================================================================
// Fault Injection
// =============================================================================

/// MemoryStore that fails selected commands
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    /// (command name, key) pairs to fail; `None` matches any key
    faults: Mutex<Vec<(&'static str, Option<String>)>>,
    /// Fail whole batches as if the connection dropped
    down: Mutex<bool>,
}

impl FlakyStore {
    fn fail(&self, command: &'static str, key: Option<&str>) {
        self.faults.lock().push((command, key.map(str::to_string)));
    }

    fn injected(&self, command: &Command) -> Option<PageError> {
        let key = match command {
            Command::Get { key } => Some(key.as_str()),
            Command::ZScore { member, .. } => Some(member.as_str()),
            _ => None,
        };
        let faults = self.faults.lock();
        faults
            .iter()
            .any(|(name, k)| *name == command.name() && (k.is_none() || k.as_deref() == key))
            .then(|| PageError::Store(format!("injected {}", command.name())))
    }

    fn check_link(&self) -> pagekv::Result<()> {
        if *self.down.lock() {
            return Err(PageError::Store("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Store for FlakyStore {
    fn pipeline(&self, ctx: &Context, commands: Vec<Command>) -> pagekv::Result<Vec<pagekv::Result<Reply>>> {
        self.check_link()?;
        let faults: Vec<Option<PageError>> = commands.iter().map(|c| self.injected(c)).collect();
        let outcomes = self.inner.pipeline(ctx, commands)?;
        Ok(outcomes
            .into_iter()
            .zip(faults)
            .map(|(outcome, fault)| match fault {
                Some(err) => Err(err),
                None => outcome,
            })
            .collect())
    }

    fn transaction(&self, ctx: &Context, commands: Vec<Command>) -> pagekv::Result<Vec<Reply>> {
        self.check_link()?;
        if let Some(err) = commands.iter().find_map(|c| self.injected(c)) {
            return Err(err);
        }
        self.inner.transaction(ctx, commands)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Serialize)]
struct Post {
    id: String,
    score: i64,
}

impl_taggable!(Post, id = id, score = score);

fn post(id: &str, score: i64) -> Post {
    Post {
        id: id.to_string(),
        score,
    }
}

fn setup() -> (Arc<FlakyStore>, Collection) {
    let store = Arc::new(FlakyStore::default());
    let feed = Collection::open(store.clone(), "feed").unwrap();
    feed.write()
        .values(&[post("a", 1), post("b", 2), post("c", 3)])
        .exec()
        .unwrap();
    (store, feed)
}

// =============================================================================
// Batch Read Tests
// =============================================================================

#[test]
fn test_nil_first_failure_is_suppressed() {
    let (store, feed) = setup();
    store.fail("GET", Some("feed:c"));

    // the missing key fails first with nil, so the batch survives
    let items = feed.read().ids(["missing", "a", "c"]).exec().unwrap();

    assert_eq!(items[0].error(), Some(&PageError::Nil));
    assert!(items[1].is_ok());
    assert_eq!(items[2].error(), Some(&PageError::Store("injected GET".to_string())));
}

#[test]
fn test_non_nil_first_failure_aborts_batch() {
    let (store, feed) = setup();
    store.fail("GET", Some("feed:a"));

    let err = feed.read().ids(["a", "missing"]).exec().unwrap_err();
    assert_eq!(err, PageError::Store("injected GET".to_string()));
}

#[test]
fn test_transport_failure_aborts_read() {
    let (store, feed) = setup();
    *store.down.lock() = true;

    let err = feed.read().ids(["a"]).exec().unwrap_err();
    assert_eq!(err, PageError::Store("connection refused".to_string()));
}

#[test]
fn test_transport_failure_aborts_page() {
    let (store, feed) = setup();
    *store.down.lock() = true;

    assert!(feed.read().page(2).exec().is_err());
}

#[test]
fn test_empty_batch_skips_store() {
    let (store, _feed) = setup();
    *store.down.lock() = true;

    let ctx = Context::background();
    let operator = Operator::new(&*store, &ctx, "feed");
    assert!(operator.read_data(Vec::new()).unwrap().is_empty());
    assert!(operator.read_meta(Vec::new()).unwrap().is_empty());
}

// =============================================================================
// Write / Delete Failure Tests
// =============================================================================

#[test]
fn test_failed_transaction_applies_nothing() {
    let (store, feed) = setup();
    store.fail("SET", None);

    let err = feed.write().value(&post("d", 4)).exec().unwrap_err();
    assert_eq!(err, PageError::Store("injected SET".to_string()));
    assert_eq!(feed.count(&Context::background()).unwrap(), 3);
}

#[test]
fn test_failed_delete_surfaces() {
    let (store, feed) = setup();
    store.fail("UNLINK", None);

    assert!(feed.delete(["a"]).exec().is_err());
    assert_eq!(feed.count(&Context::background()).unwrap(), 3);
}

// =============================================================================
// Operator Unit Tests
// =============================================================================

#[test]
fn test_resolve_cursor_by_order() {
    let (store, _feed) = setup();
    let ctx = Context::background();
    let operator = Operator::new(&*store, &ctx, "feed");

    assert_eq!(operator.resolve_cursor("feed", None, Order::Ascending).unwrap(), 0);
    assert_eq!(operator.resolve_cursor("feed", Some("a"), Order::Ascending).unwrap(), 1);
    assert_eq!(operator.resolve_cursor("feed", Some("a"), Order::Descending).unwrap(), 3);
    assert_eq!(
        operator.resolve_cursor("feed", Some("zz"), Order::Descending),
        Err(PageError::CursorNotFound("feed:zz".to_string()))
    );
}

#[test]
fn test_read_range_by_order() {
    let (store, _feed) = setup();
    let ctx = Context::background();
    let operator = Operator::new(&*store, &ctx, "feed");

    assert_eq!(
        operator.read_range(1, 5, Order::Ascending).unwrap(),
        ["feed:b", "feed:c"]
    );
    assert_eq!(
        operator.read_range(0, 2, Order::Descending).unwrap(),
        ["feed:c", "feed:b"]
    );
}

#[test]
fn test_write_queues_one_transaction() {
    let store = MemoryStore::new();
    let ctx = Context::background();
    let operator = Operator::new(&store, &ctx, "feed");
    let records: Vec<Record> = [post("a", 1), post("b", 2)]
        .iter()
        .map(|p| Record::new(p, "feed", std::time::Duration::from_secs(60)).unwrap())
        .collect();

    let mut tx = Transaction::new();
    operator.write_meta(&mut tx, &records, false);
    operator.write_data(&mut tx, "feed", &records, false).unwrap();

    let names: Vec<&str> = tx.commands().iter().map(Command::name).collect();
    assert_eq!(names, ["ZADD", "SET", "SET"]);

    operator.commit(tx).unwrap();
    assert_eq!(operator.count().unwrap(), 2);
}

#[test]
fn test_delete_queues_index_and_payload_removal() {
    let store = MemoryStore::new();
    let ctx = Context::background();
    let operator = Operator::new(&store, &ctx, "feed");
    let keys = vec!["feed:a".to_string()];

    let mut tx = Transaction::new();
    operator.delete_meta(&mut tx, &keys);
    operator.delete_data(&mut tx, &keys);

    let names: Vec<&str> = tx.commands().iter().map(Command::name).collect();
    assert_eq!(names, ["ZREM", "UNLINK"]);
}
