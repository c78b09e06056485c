//! # pagekv
//!
//! Cursor-based pagination and bounded-retention caching on top of an
//! ordered-set + key/value store:
//! - Dual-structure records: a score-ordered index row plus an expiring payload
//! - Opaque cursors resolved to ranks, ascending or descending
//! - Batched reads with per-item error isolation
//! - Debounced retention that caps the index size
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Collection                            │
//! │          (index key, data prefix, expiry, retention)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼────────────┐
//!          ▼            ▼            ▼
//!   ┌───────────┐ ┌───────────┐ ┌───────────┐
//!   │  Reader   │ │  Writer   │ │  Deleter  │
//!   └─────┬─────┘ └─────┬─────┘ └─────┬─────┘
//!         └─────────────┼─────────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │   Operator   │
//!               └──────┬───────┘
//!                      ▼
//!        ┌──────────────────────────────┐
//!        │            Store             │
//!        │ (sorted set + string values) │
//!        └──────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use pagekv::{impl_taggable, Collection, MemoryStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Post { id: String, at: i64 }
//! impl_taggable!(Post, id = id, score = at);
//!
//! let feed = Collection::open(Arc::new(MemoryStore::new()), "feed").unwrap();
//! let posts: Vec<Post> = ["a", "b", "c"]
//!     .iter()
//!     .zip(1..)
//!     .map(|(id, at)| Post { id: id.to_string(), at })
//!     .collect();
//! feed.write().values(&posts).exec().unwrap();
//!
//! let page = feed.read().page(2).exec().unwrap();
//! assert_eq!(page.iter().map(|r| r.id()).collect::<Vec<_>>(), ["a", "b"]);
//!
//! let next = feed.read().page(2).after("b").exec().unwrap();
//! assert_eq!(next[0].scan::<Post>().unwrap().id, "c");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod context;
pub mod logger;
pub mod keys;

pub mod record;
pub mod store;
pub mod result;
pub mod operator;
pub mod session;
pub mod collection;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PageError, Result};
pub use config::{CollectionConfig, ConfigBuilder, Order, RetentionPolicy};
pub use context::Context;
pub use logger::{FailureLogger, TracingLogger};
pub use record::{IndexEntry, IntoScore, Record, Taggable};
pub use store::{MemoryStore, Store};
pub use result::{ItemResult, RawValue};
pub use session::{Deleter, Reader, Writer};
pub use collection::Collection;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pagekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
