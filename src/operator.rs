//! Operator Module
//!
//! The paging engine that drives the store on behalf of a session.
//!
//! ## Responsibilities
//! - Resolve cursors to ranks and read pages of index members
//! - Batch score / payload lookups with per-item error isolation
//! - Queue index + payload writes and deletes on one transaction
//! - Trim the index to its retention cap, at most once per interval

use crate::config::{Order, RetentionPolicy};
use crate::context::Context;
use crate::error::{PageError, Result};
use crate::keys;
use crate::logger::FailureLogger;
use crate::record::{IndexEntry, Record};
use crate::result::{ItemResult, RawValue};
use crate::store::{AddMode, Command, Reply, Store, Transaction};

/// Namespace of retention flag keys: `pagekv:retention:{index_key}`
pub const RETENTION_FLAG: &str = "pagekv:retention";

/// Drives one call against the store
///
/// Borrowed for the lifetime of a single session execution; holds no state
/// of its own.
pub struct Operator<'a> {
    store: &'a dyn Store,
    ctx: &'a Context,
    index_key: &'a str,
}

impl<'a> Operator<'a> {
    pub fn new(store: &'a dyn Store, ctx: &'a Context, index_key: &'a str) -> Self {
        Self {
            store,
            ctx,
            index_key,
        }
    }

    fn call(&self, command: Command) -> Result<Reply> {
        self.ctx.check()?;
        tracing::trace!("{} on {}", command.name(), self.index_key);
        self.store.execute(self.ctx, command)
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Rank at which the page after `last_id` starts
    ///
    /// No cursor starts at rank 0. An id missing from the index fails with
    /// [`PageError::CursorNotFound`].
    pub fn resolve_cursor(&self, prefix: &str, last_id: Option<&str>, order: Order) -> Result<i64> {
        let Some(last_id) = last_id else {
            return Ok(0);
        };

        let cursor = keys::data_key(prefix, last_id);
        let command = match order {
            Order::Ascending => Command::ZRank {
                key: self.index_key.to_string(),
                member: cursor.clone(),
            },
            Order::Descending => Command::ZRevRank {
                key: self.index_key.to_string(),
                member: cursor.clone(),
            },
        };

        match self.call(command)?.into_int()? {
            Some(rank) => Ok(rank + 1),
            None => Err(PageError::CursorNotFound(cursor)),
        }
    }

    /// Members over ranks `[start, start + count - 1]`
    ///
    /// The stop rank saturates so a huge count never wraps into a
    /// from-the-end index.
    pub fn read_range(&self, start: i64, count: i64, order: Order) -> Result<Vec<String>> {
        let key = self.index_key.to_string();
        let stop = start.saturating_add(count.saturating_sub(1));
        let command = match order {
            Order::Ascending => Command::ZRange { key, start, stop },
            Order::Descending => Command::ZRevRange { key, start, stop },
        };
        self.call(command)?.into_members()
    }

    /// Cursor → range → batch read, in range order
    pub fn read_page(
        &self,
        prefix: &str,
        last_id: Option<&str>,
        count: i64,
        only_meta: bool,
        order: Order,
    ) -> Result<Vec<ItemResult>> {
        let start = self.resolve_cursor(prefix, last_id, order)?;
        let members = self.read_range(start, count, order)?;

        if only_meta {
            self.read_meta(members)
        } else {
            self.read_data(members)
        }
    }

    /// Index scores of `keys`
    pub fn read_meta(&self, keys: Vec<String>) -> Result<Vec<ItemResult>> {
        let index_key = self.index_key;
        self.read_batch(keys, |key| Command::ZScore {
            key: index_key.to_string(),
            member: key.to_string(),
        })
    }

    /// Payloads of `keys`
    pub fn read_data(&self, keys: Vec<String>) -> Result<Vec<ItemResult>> {
        self.read_batch(keys, |key| Command::Get {
            key: key.to_string(),
        })
    }

    /// One pipelined lookup per key
    ///
    /// The batch fails only when the transport fails or when the first failed
    /// lookup failed with something other than a nil reply. Otherwise every
    /// failure stays on its own item.
    fn read_batch<F>(&self, keys: Vec<String>, lookup: F) -> Result<Vec<ItemResult>>
    where
        F: Fn(&str) -> Command,
    {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        self.ctx.check()?;
        let commands = keys.iter().map(|key| lookup(key.as_str())).collect();
        let outcomes = self.store.pipeline(self.ctx, commands)?;

        if outcomes.len() != keys.len() {
            return Err(PageError::Store(format!(
                "pipeline returned {} replies for {} commands",
                outcomes.len(),
                keys.len()
            )));
        }

        let values: Vec<Result<RawValue>> = outcomes
            .into_iter()
            .map(|outcome| outcome.and_then(raw_value))
            .collect();

        if let Some(err) = values.iter().find_map(|v| v.as_ref().err()) {
            if !err.is_nil() {
                return Err(err.clone());
            }
        }

        Ok(keys
            .into_iter()
            .zip(values)
            .map(|(key, value)| ItemResult::new(key, value))
            .collect())
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Queue the index rows of `records`
    pub fn write_meta(&self, tx: &mut Transaction, records: &[Record], overwrite: bool) {
        if records.is_empty() {
            return;
        }

        let entries: Vec<IndexEntry> = records.iter().map(|r| r.entry().clone()).collect();
        tx.push(Command::ZAdd {
            key: self.index_key.to_string(),
            entries,
            mode: AddMode::from_overwrite(overwrite),
        });
    }

    /// Queue the payloads of `records`, each with its own expiry
    ///
    /// Every record must belong to `prefix`; one that does not fails the
    /// whole call with [`PageError::InvalidMetaKeyType`].
    pub fn write_data(
        &self,
        tx: &mut Transaction,
        prefix: &str,
        records: &[Record],
        overwrite: bool,
    ) -> Result<()> {
        if let Some(stray) = records.iter().find(|r| !keys::belongs_to(r.key(), prefix)) {
            return Err(PageError::InvalidMetaKeyType(stray.key().to_string()));
        }

        let mode = AddMode::from_overwrite(overwrite);
        for record in records {
            tx.push(Command::Set {
                key: record.key().to_string(),
                value: record.payload().clone(),
                expiry: Some(record.expiry()),
                mode,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Delete Path
    // =========================================================================

    /// Queue removal of `keys` from the index
    pub fn delete_meta(&self, tx: &mut Transaction, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        tx.push(Command::ZRem {
            key: self.index_key.to_string(),
            members: keys.to_vec(),
        });
    }

    /// Queue an unlink of the payloads under `keys`
    pub fn delete_data(&self, tx: &mut Transaction, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        tx.push(Command::Unlink {
            keys: keys.to_vec(),
        });
    }

    /// Send a queued transaction; a nil reply error is not a failure
    pub fn commit(&self, tx: Transaction) -> Result<()> {
        match tx.exec(self.store, self.ctx) {
            Ok(_) => Ok(()),
            Err(err) if err.is_nil() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Member count of the index
    pub fn count(&self) -> Result<i64> {
        let reply = self.call(Command::ZCard {
            key: self.index_key.to_string(),
        })?;
        Ok(reply.into_int()?.unwrap_or(0))
    }

    // =========================================================================
    // Retention
    // =========================================================================

    /// Key of this index's retention flag
    pub fn retention_flag(&self) -> String {
        keys::generate_key(&[RETENTION_FLAG, self.index_key])
    }

    /// Trim the index unless a pass ran within the last interval
    ///
    /// Best effort: failures go to `logger` and never reach the caller.
    pub fn try_retention(&self, policy: &RetentionPolicy, order: Order, logger: &dyn FailureLogger) {
        let flag = self.retention_flag();

        match self.call(Command::Exists {
            keys: vec![flag.clone()],
        }) {
            Ok(Reply::Int(n)) if n > 0 => return,
            Ok(_) => {}
            Err(err) => logger.error(&format!(
                "failed to check retention flag on {}: {}",
                self.index_key, err
            )),
        }

        match self.trim(policy.max_entries, order) {
            Ok(0) => {}
            Ok(trimmed) => tracing::debug!("Retention trimmed {} entries from {}", trimmed, self.index_key),
            Err(err) => logger.error(&format!("failed to retention on {}: {}", self.index_key, err)),
        }

        let set_flag = self.call(Command::Set {
            key: flag,
            value: bytes::Bytes::new(),
            expiry: Some(policy.interval),
            mode: AddMode::IfAbsent,
        });
        if let Err(err) = set_flag {
            logger.error(&format!(
                "failed to set retention flag on {}: {}",
                self.index_key, err
            ));
        }
    }

    /// Drop the oldest end of the index down to `max_entries`
    ///
    /// Only index rows are removed; payloads are left to their own expiry.
    fn trim(&self, max_entries: i64, order: Order) -> Result<i64> {
        let count = self.count()?;
        if count <= max_entries {
            return Ok(0);
        }

        let key = self.index_key.to_string();
        let mut tx = Transaction::new();
        if max_entries <= 0 {
            tx.push(Command::Del { keys: vec![key] });
        } else {
            let (start, stop) = match order {
                Order::Ascending => (max_entries, -1),
                Order::Descending => (0, count - max_entries - 1),
            };
            tx.push(Command::ZRemRangeByRank { key, start, stop });
        }

        tx.exec(self.store, self.ctx)?;
        Ok(count - max_entries.max(0))
    }
}

/// Map a lookup reply onto a per-item value; `Nil` becomes [`PageError::Nil`]
fn raw_value(reply: Reply) -> Result<RawValue> {
    match reply {
        Reply::Data(bytes) => Ok(RawValue::Data(bytes)),
        Reply::Float(score) => Ok(RawValue::Score(score)),
        Reply::Nil => Err(PageError::Nil),
        other => Err(PageError::Store(format!("unexpected lookup reply {:?}", other))),
    }
}
