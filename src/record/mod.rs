//! Record Module
//!
//! The shape of a storable item: an [`IndexEntry`] for the ordered index plus
//! the serialized payload stored under the same key.
//!
//! ## Layout
//! ```text
//! index  (sorted set)          payloads (strings, with TTL)
//! ┌──────────────────────┐     ┌──────────────────────────────┐
//! │ score │ prefix:id    │ ──▶ │ prefix:id  →  {"id":..,...}  │
//! └──────────────────────┘     └──────────────────────────────┘
//! ```
//! Both halves of a record are written in one transaction.

mod score;

use std::time::Duration;

use bytes::Bytes;

use crate::error::{PageError, Result};
use crate::keys;

pub use score::{epoch_seconds, now_score, IntoScore, Taggable};

/// A (score, member) row of the ordered index
///
/// `member` is always the fully-qualified data key, never the bare id.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub score: f64,
    pub member: String,
}

impl IndexEntry {
    pub fn new(score: f64, member: impl Into<String>) -> Self {
        Self {
            score,
            member: member.into(),
        }
    }
}

/// A value ready to be written: index row + JSON payload
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    entry: IndexEntry,
    payload: Bytes,
    expiry: Duration,
}

impl Record {
    /// Build a record for a collection whose data keys live under `prefix`
    ///
    /// Fails with [`PageError::MissingId`] when the value has no identifier.
    pub fn new<T: Taggable + ?Sized>(value: &T, prefix: &str, expiry: Duration) -> Result<Self> {
        let id = value.identifier();
        if id.is_empty() {
            return Err(PageError::MissingId {
                type_name: std::any::type_name::<T>(),
            });
        }

        let score = value.sort_score().unwrap_or_else(now_score);
        let payload = serde_json::to_vec(value)?;

        Ok(Self {
            entry: IndexEntry::new(score, keys::data_key(prefix, &id)),
            id,
            payload: Bytes::from(payload),
            expiry,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fully-qualified data key
    pub fn key(&self) -> &str {
        &self.entry.member
    }

    pub fn score(&self) -> f64 {
        self.entry.score
    }

    pub fn entry(&self) -> &IndexEntry {
        &self.entry
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }
}
