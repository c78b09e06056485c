//! Deleter session

use crate::collection::Collection;
use crate::context::Context;
use crate::error::Result;
use crate::keys;
use crate::operator::Operator;
use crate::store::Transaction;

/// Removes ids from the index and, unless only-meta, their payloads
#[derive(Debug)]
pub struct Deleter {
    collection: Collection,
    ctx: Context,
    ids: Vec<String>,
    only_meta: bool,
}

impl Deleter {
    pub(crate) fn new(collection: Collection, ids: Vec<String>) -> Self {
        Self {
            collection,
            ctx: Context::background(),
            ids,
            only_meta: false,
        }
    }

    /// Run under `ctx`
    pub fn with(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Keep payloads, remove only index rows
    pub fn only_meta(mut self) -> Self {
        self.only_meta = true;
        self
    }

    pub fn exec(self) -> Result<()> {
        if self.ids.is_empty() {
            return Ok(());
        }

        let config = self.collection.config();
        let operator = Operator::new(self.collection.store(), &self.ctx, &config.index_key);

        let keys: Vec<String> = self
            .ids
            .iter()
            .map(|id| keys::data_key(&config.data_prefix, id))
            .collect();

        let mut tx = Transaction::new();
        operator.delete_meta(&mut tx, &keys);
        if !self.only_meta {
            operator.delete_data(&mut tx, &keys);
        }
        operator.commit(tx)
    }
}
