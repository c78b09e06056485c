//! Configuration for pagekv collections
//!
//! Centralized configuration with sensible defaults. A built
//! [`CollectionConfig`] is immutable; sessions share it through an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{PageError, Result};
use crate::logger::{FailureLogger, TracingLogger};

/// Default lifetime of a stored payload
pub const DEFAULT_DATA_EXPIRY: Duration = Duration::from_secs(5 * 60);

/// Default cap on index entries once retention is enabled
pub const DEFAULT_MAX_ENTRIES: i64 = 10_000;

/// Default time between retention passes
pub const DEFAULT_RETENTION_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Configuration of one collection
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    // -------------------------------------------------------------------------
    // Keys
    // -------------------------------------------------------------------------
    /// Key of the ordered index (sorted set)
    pub index_key: String,

    /// Prefix of payload keys; members are `{data_prefix}:{id}`
    pub data_prefix: String,

    // -------------------------------------------------------------------------
    // Payloads
    // -------------------------------------------------------------------------
    /// Expiry applied to every payload written
    pub data_expiry: Duration,

    // -------------------------------------------------------------------------
    // Paging
    // -------------------------------------------------------------------------
    /// Direction of ranks and pages
    pub order: Order,

    // -------------------------------------------------------------------------
    // Retention
    // -------------------------------------------------------------------------
    /// Eviction policy, `None` disables retention
    pub retention: Option<RetentionPolicy>,

    /// Receives retention failures
    pub logger: Arc<dyn FailureLogger>,
}

/// Ordering of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Lowest score first
    #[default]
    Ascending,

    /// Highest score first
    Descending,
}

/// Bounded retention of index entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Entries kept after a pass; `<= 0` drops the whole index
    pub max_entries: i64,

    /// Minimum time between passes, also the lifetime of the retention flag
    pub interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            interval: DEFAULT_RETENTION_INTERVAL,
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            index_key: String::new(),
            data_prefix: String::new(),
            data_expiry: DEFAULT_DATA_EXPIRY,
            order: Order::Ascending,
            retention: None,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl CollectionConfig {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Builder seeded with this configuration
    pub fn to_builder(&self) -> ConfigBuilder {
        ConfigBuilder {
            config: self.clone(),
            data_prefix_set: self.data_prefix != self.index_key,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_key.is_empty() {
            return Err(PageError::Config("index key must not be empty".to_string()));
        }
        if self.data_prefix.is_empty() {
            return Err(PageError::Config("data prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for CollectionConfig
#[derive(Default)]
pub struct ConfigBuilder {
    config: CollectionConfig,

    /// Whether the data prefix was set explicitly rather than following the index key
    data_prefix_set: bool,
}

impl ConfigBuilder {
    /// Set the index key; the data prefix follows it unless set explicitly
    pub fn index_key(mut self, key: impl Into<String>) -> Self {
        self.config.index_key = key.into();
        self
    }

    /// Set the payload key prefix
    pub fn data_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.data_prefix = prefix.into();
        self.data_prefix_set = true;
        self
    }

    /// Set the payload expiry
    pub fn data_expiry(mut self, expiry: Duration) -> Self {
        self.config.data_expiry = expiry;
        self
    }

    /// Set the order
    pub fn order(mut self, order: Order) -> Self {
        self.config.order = order;
        self
    }

    /// Highest score first
    pub fn descending(self) -> Self {
        self.order(Order::Descending)
    }

    /// Enable retention; a zero interval disables it
    pub fn retention(mut self, max_entries: i64, interval: Duration) -> Self {
        self.config.retention = if interval.is_zero() {
            None
        } else {
            Some(RetentionPolicy {
                max_entries,
                interval,
            })
        };
        self
    }

    /// Replace the retention policy
    pub fn retention_policy(mut self, policy: Option<RetentionPolicy>) -> Self {
        self.config.retention = policy.filter(|p| !p.interval.is_zero());
        self
    }

    /// Set the failure logger
    pub fn logger(mut self, logger: Arc<dyn FailureLogger>) -> Self {
        self.config.logger = logger;
        self
    }

    pub fn build(mut self) -> Result<CollectionConfig> {
        if !self.data_prefix_set {
            self.config.data_prefix = self.config.index_key.clone();
        }
        self.config.validate()?;
        Ok(self.config)
    }
}
