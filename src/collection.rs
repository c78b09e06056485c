//! Collection
//!
//! A configured index + payload namespace on a store, and the entry point for
//! sessions.

use std::sync::Arc;

use crate::config::{CollectionConfig, ConfigBuilder};
use crate::context::Context;
use crate::error::Result;
use crate::operator::Operator;
use crate::session::{Deleter, Reader, Writer};
use crate::store::Store;

/// A paged, optionally retention-capped collection of records
///
/// Cheap to clone: clones share the store connection and the immutable
/// configuration.
#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn Store>,
    config: Arc<CollectionConfig>,
}

impl Collection {
    /// Create a collection from a built configuration
    pub fn new(store: Arc<dyn Store>, config: CollectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }

    /// Collection with default settings whose index key and data prefix are `index_key`
    pub fn open(store: Arc<dyn Store>, index_key: impl Into<String>) -> Result<Self> {
        let config = CollectionConfig::builder().index_key(index_key).build()?;
        Self::new(store, config)
    }

    /// Builder seeded with this collection's configuration
    pub fn to_builder(&self) -> ConfigBuilder {
        self.config.to_builder()
    }

    /// A collection on the same store with another configuration
    pub fn reconfigure(&self, config: CollectionConfig) -> Result<Self> {
        Self::new(Arc::clone(&self.store), config)
    }

    /// This configuration on another store
    pub fn with_store(&self, store: Arc<dyn Store>) -> Self {
        Self {
            store,
            config: Arc::clone(&self.config),
        }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    pub fn read(&self) -> Reader {
        Reader::new(self.clone())
    }

    pub fn write(&self) -> Writer {
        Writer::new(self.clone())
    }

    pub fn delete<I, S>(&self, ids: I) -> Deleter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Deleter::new(self.clone(), ids.into_iter().map(Into::into).collect())
    }

    /// Number of entries in the index
    pub fn count(&self, ctx: &Context) -> Result<i64> {
        Operator::new(self.store(), ctx, &self.config.index_key).count()
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
