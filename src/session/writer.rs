//! Writer session

use crate::collection::Collection;
use crate::context::Context;
use crate::error::{PageError, Result};
use crate::operator::Operator;
use crate::record::{Record, Taggable};
use crate::store::Transaction;

/// Writes records to the index and the payload store
///
/// Values are turned into [`Record`]s as they are added. The first value that
/// cannot be turned into a record is reported by `exec`, before any store
/// call is made.
#[derive(Debug)]
pub struct Writer {
    collection: Collection,
    ctx: Context,
    records: Vec<Record>,
    failure: Option<PageError>,
    only_meta: bool,
}

impl Writer {
    pub(crate) fn new(collection: Collection) -> Self {
        Self {
            collection,
            ctx: Context::background(),
            records: Vec::new(),
            failure: None,
            only_meta: false,
        }
    }

    /// Run under `ctx`
    pub fn with(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Write only index rows, no payloads
    pub fn only_meta(mut self) -> Self {
        self.only_meta = true;
        self
    }

    /// Add one value
    pub fn value<T: Taggable + ?Sized>(mut self, value: &T) -> Self {
        if self.failure.is_some() {
            return self;
        }
        let config = self.collection.config();
        match Record::new(value, &config.data_prefix, config.data_expiry) {
            Ok(record) => self.records.push(record),
            Err(err) => self.failure = Some(err),
        }
        self
    }

    /// Add a sequence of values
    pub fn values<'v, T, I>(self, values: I) -> Self
    where
        T: Taggable + 'v,
        I: IntoIterator<Item = &'v T>,
    {
        values.into_iter().fold(self, |writer, value| writer.value(value))
    }

    /// Add a prebuilt record
    pub fn record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Write, leaving existing ids untouched
    pub fn exec(self) -> Result<()> {
        self.run(false)
    }

    /// Write, replacing existing scores and payloads
    pub fn exec_overwrite(self) -> Result<()> {
        self.run(true)
    }

    fn run(self, overwrite: bool) -> Result<()> {
        if let Some(err) = self.failure {
            return Err(err);
        }

        let config = self.collection.config();
        let operator = Operator::new(self.collection.store(), &self.ctx, &config.index_key);

        if let Some(policy) = &config.retention {
            operator.try_retention(policy, config.order, config.logger.as_ref());
        }

        if self.records.is_empty() {
            return Ok(());
        }

        let mut tx = Transaction::new();
        operator.write_meta(&mut tx, &self.records, overwrite);
        if !self.only_meta {
            operator.write_data(&mut tx, &config.data_prefix, &self.records, overwrite)?;
        }

        tracing::trace!(
            "Writing {} records to {} (overwrite={})",
            self.records.len(),
            config.index_key,
            overwrite
        );
        operator.commit(tx)
    }
}
