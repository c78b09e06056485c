//! Command and reply definitions
//!
//! The subset of ordered-set / key-value primitives the engine issues.

use std::time::Duration;

use bytes::Bytes;

use crate::error::{PageError, Result};
use crate::record::IndexEntry;

/// Insert semantics shared by `ZADD` and `SET`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMode {
    /// Unconditionally set (`ZADD` / `SET`)
    Upsert,

    /// Only add when absent (`ZADD NX` / `SET NX`)
    IfAbsent,
}

impl AddMode {
    pub fn from_overwrite(overwrite: bool) -> Self {
        if overwrite {
            AddMode::Upsert
        } else {
            AddMode::IfAbsent
        }
    }
}

/// A single store command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ascending rank of a member, `Nil` when absent
    ZRank { key: String, member: String },

    /// Descending rank of a member, `Nil` when absent
    ZRevRank { key: String, member: String },

    /// Members in ascending order over an inclusive rank interval
    ZRange { key: String, start: i64, stop: i64 },

    /// Members in descending order over an inclusive rank interval
    ZRevRange { key: String, start: i64, stop: i64 },

    /// Score of a member, `Nil` when absent
    ZScore { key: String, member: String },

    /// Number of members
    ZCard { key: String },

    /// Add or update members
    ZAdd {
        key: String,
        entries: Vec<IndexEntry>,
        mode: AddMode,
    },

    /// Remove members
    ZRem { key: String, members: Vec<String> },

    /// Remove members over an inclusive ascending rank interval
    ZRemRangeByRank { key: String, start: i64, stop: i64 },

    /// Value of a key, `Nil` when absent or expired
    Get { key: String },

    /// Set a value with optional expiry; `IfAbsent` replies `Nil` when not set
    Set {
        key: String,
        value: Bytes,
        expiry: Option<Duration>,
        mode: AddMode,
    },

    /// Asynchronous delete of keys
    Unlink { keys: Vec<String> },

    /// Synchronous delete of keys
    Del { keys: Vec<String> },

    /// Number of the given keys that exist
    Exists { keys: Vec<String> },
}

impl Command {
    /// Command name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::ZRank { .. } => "ZRANK",
            Command::ZRevRank { .. } => "ZREVRANK",
            Command::ZRange { .. } => "ZRANGE",
            Command::ZRevRange { .. } => "ZREVRANGE",
            Command::ZScore { .. } => "ZSCORE",
            Command::ZCard { .. } => "ZCARD",
            Command::ZAdd { .. } => "ZADD",
            Command::ZRem { .. } => "ZREM",
            Command::ZRemRangeByRank { .. } => "ZREMRANGEBYRANK",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Unlink { .. } => "UNLINK",
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
        }
    }

    /// Whether the command leaves the store unchanged
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Command::ZRank { .. }
                | Command::ZRevRank { .. }
                | Command::ZRange { .. }
                | Command::ZRevRange { .. }
                | Command::ZScore { .. }
                | Command::ZCard { .. }
                | Command::Get { .. }
                | Command::Exists { .. }
        )
    }
}

/// A reply to a single command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Absent key or member
    Nil,

    /// Status reply
    Ok,

    Int(i64),

    Float(f64),

    Data(Bytes),

    Members(Vec<String>),
}

impl Reply {
    /// Integer reply; `Nil` maps to `None`
    pub fn into_int(self) -> Result<Option<i64>> {
        match self {
            Reply::Int(n) => Ok(Some(n)),
            Reply::Nil => Ok(None),
            other => Err(unexpected("integer", &other)),
        }
    }

    pub fn into_members(self) -> Result<Vec<String>> {
        match self {
            Reply::Members(members) => Ok(members),
            other => Err(unexpected("member list", &other)),
        }
    }
}

fn unexpected(expected: &str, got: &Reply) -> PageError {
    PageError::Store(format!("expected {} reply, got {:?}", expected, got))
}
