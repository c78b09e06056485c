//! Reader session

use crate::collection::Collection;
use crate::context::Context;
use crate::error::Result;
use crate::keys;
use crate::operator::Operator;
use crate::result::ItemResult;

/// Paginated or by-id read
///
/// A positive page count takes precedence over an id list; with neither,
/// `exec` returns an empty list without touching the store.
#[derive(Debug)]
pub struct Reader {
    collection: Collection,
    ctx: Context,
    only_meta: bool,
    last_id: Option<String>,
    count: i64,
    keys: Vec<String>,
}

impl Reader {
    pub(crate) fn new(collection: Collection) -> Self {
        Self {
            collection,
            ctx: Context::background(),
            only_meta: false,
            last_id: None,
            count: 0,
            keys: Vec::new(),
        }
    }

    /// Run under `ctx`
    pub fn with(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Read index scores instead of payloads
    pub fn only_meta(mut self) -> Self {
        self.only_meta = true;
        self
    }

    /// Read `count` items
    pub fn page(mut self, count: i64) -> Self {
        self.count = count;
        self
    }

    /// Start after the item with this id
    pub fn after(mut self, last_id: impl Into<String>) -> Self {
        self.last_id = Some(last_id.into());
        self
    }

    /// Read these ids, in this order
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefix = &self.collection.config().data_prefix;
        self.keys = ids
            .into_iter()
            .map(|id| keys::data_key(prefix, id.as_ref()))
            .collect();
        self
    }

    pub fn exec(self) -> Result<Vec<ItemResult>> {
        let config = self.collection.config();
        let operator = Operator::new(self.collection.store(), &self.ctx, &config.index_key);

        let items = if self.count > 0 {
            operator.read_page(
                &config.data_prefix,
                self.last_id.as_deref(),
                self.count,
                self.only_meta,
                config.order,
            )?
        } else if self.only_meta {
            operator.read_meta(self.keys)?
        } else {
            operator.read_data(self.keys)?
        };

        Ok(items
            .into_iter()
            .map(|item| item.scoped(&config.data_prefix))
            .collect())
    }
}
