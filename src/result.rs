//! Read results
//!
//! One [`ItemResult`] per requested key, in request order.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{PageError, Result};
use crate::keys;

/// Raw value of a read
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Index score (only-meta reads)
    Score(f64),

    /// Serialized payload
    Data(Bytes),
}

/// Outcome of reading one key
#[derive(Debug, Clone, PartialEq)]
pub struct ItemResult {
    key: String,
    /// Byte offset of the id within `key`
    id_start: usize,
    outcome: std::result::Result<RawValue, PageError>,
}

impl ItemResult {
    pub(crate) fn new(key: String, outcome: std::result::Result<RawValue, PageError>) -> Self {
        let id_start = key.len() - keys::id_from_key(&key).len();
        Self {
            key,
            id_start,
            outcome,
        }
    }

    /// Take the id as everything after `prefix:`, so ids may contain the separator
    pub(crate) fn scoped(mut self, prefix: &str) -> Self {
        if let Some(id) = keys::id_within(&self.key, prefix) {
            self.id_start = self.key.len() - id.len();
        }
        self
    }

    /// Id of the item
    ///
    /// Everything after the collection's data prefix. A key outside the
    /// prefix yields its trailing segment.
    pub fn id(&self) -> &str {
        &self.key[self.id_start..]
    }

    /// Fully-qualified key
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn raw(&self) -> Option<&RawValue> {
        self.outcome.as_ref().ok()
    }

    /// Index score, for only-meta reads
    pub fn score(&self) -> Option<f64> {
        match self.raw() {
            Some(RawValue::Score(score)) => Some(*score),
            _ => None,
        }
    }

    /// Per-item error, e.g. [`PageError::Nil`] for an absent or expired key
    pub fn error(&self) -> Option<&PageError> {
        self.outcome.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Decode the JSON payload
    ///
    /// Returns the item's own error when the read failed, and
    /// [`PageError::NotText`] when the raw value is a score.
    pub fn scan<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.outcome {
            Ok(RawValue::Data(bytes)) => Ok(serde_json::from_slice(bytes)?),
            Ok(RawValue::Score(_)) => Err(PageError::NotText),
            Err(err) => Err(err.clone()),
        }
    }
}
