//! In-memory store
//!
//! Sorted sets and expiring string keys behind one `parking_lot::RwLock`,
//! with Redis semantics for the commands in [`Command`].

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::context::Context;
use crate::error::{PageError, Result};
use crate::record::IndexEntry;

use super::{AddMode, Command, Reply, Store};

/// In-memory ordered-set + key/value store
///
/// ## Concurrency:
/// - Read-only commands share the read lock
/// - Mutations and whole transactions hold the write lock, so a transaction
///   is atomic with respect to every other caller
///
/// ## Expiry:
/// String keys expire lazily: an expired key reads as absent and is dropped
/// on the next mutation that touches it. [`MemoryStore::advance`] moves the
/// store clock forward without sleeping.
pub struct MemoryStore {
    state: RwLock<State>,

    /// Added to `Instant::now()` for every expiry decision
    skew: Mutex<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            skew: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the store clock forward
    pub fn advance(&self, by: Duration) {
        *self.skew.lock() += by;
    }

    /// Number of live keys (strings and sorted sets)
    pub fn key_count(&self) -> usize {
        let now = self.now();
        let state = self.state.read();
        state.strings.values().filter(|s| s.is_live(now)).count() + state.sets.len()
    }

    /// Remaining lifetime of a string key, `None` when absent or persistent
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = self.now();
        let state = self.state.read();
        state
            .live_string(key, now)
            .and_then(|s| s.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    fn now(&self) -> Instant {
        Instant::now() + *self.skew.lock()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("key_count", &self.key_count())
            .finish()
    }
}

impl Store for MemoryStore {
    fn pipeline(&self, ctx: &Context, commands: Vec<Command>) -> Result<Vec<Result<Reply>>> {
        ctx.check()?;
        let now = self.now();

        if commands.iter().all(Command::is_read_only) {
            let state = self.state.read();
            return Ok(commands.iter().map(|c| state.query(c, now)).collect());
        }

        let mut state = self.state.write();
        Ok(commands.into_iter().map(|c| state.apply(c, now)).collect())
    }

    fn transaction(&self, ctx: &Context, commands: Vec<Command>) -> Result<Vec<Reply>> {
        ctx.check()?;
        let now = self.now();
        let mut state = self.state.write();

        // Type errors are the only runtime failures; reject before applying
        for command in &commands {
            state.check_types(command, now)?;
        }
        commands.into_iter().map(|c| state.apply(c, now)).collect()
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Default)]
struct State {
    strings: HashMap<String, StringValue>,
    sets: HashMap<String, SortedSet>,
}

#[derive(Debug, Clone)]
struct StringValue {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl StringValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

impl State {
    fn live_string(&self, key: &str, now: Instant) -> Option<&StringValue> {
        self.strings.get(key).filter(|s| s.is_live(now))
    }

    fn exists(&self, key: &str, now: Instant) -> bool {
        self.sets.contains_key(key) || self.live_string(key, now).is_some()
    }

    fn check_types(&self, command: &Command, now: Instant) -> Result<()> {
        match command {
            Command::ZRank { key, .. }
            | Command::ZRevRank { key, .. }
            | Command::ZRange { key, .. }
            | Command::ZRevRange { key, .. }
            | Command::ZScore { key, .. }
            | Command::ZCard { key }
            | Command::ZAdd { key, .. }
            | Command::ZRem { key, .. }
            | Command::ZRemRangeByRank { key, .. } => {
                if self.live_string(key, now).is_some() {
                    return Err(PageError::WrongType(key.clone()));
                }
            }
            Command::Get { key } => {
                if self.sets.contains_key(key) {
                    return Err(PageError::WrongType(key.clone()));
                }
            }
            Command::Set { .. }
            | Command::Unlink { .. }
            | Command::Del { .. }
            | Command::Exists { .. } => {}
        }
        Ok(())
    }

    fn query(&self, command: &Command, now: Instant) -> Result<Reply> {
        self.check_types(command, now)?;

        let reply = match command {
            Command::ZRank { key, member } => match self.sets.get(key).and_then(|s| s.rank(member)) {
                Some(rank) => Reply::Int(rank as i64),
                None => Reply::Nil,
            },
            Command::ZRevRank { key, member } => {
                match self.sets.get(key).and_then(|s| s.rank(member).map(|r| s.len() - 1 - r)) {
                    Some(rank) => Reply::Int(rank as i64),
                    None => Reply::Nil,
                }
            }
            Command::ZRange { key, start, stop } => Reply::Members(
                self.sets
                    .get(key)
                    .map(|s| s.range(*start, *stop, false))
                    .unwrap_or_default(),
            ),
            Command::ZRevRange { key, start, stop } => Reply::Members(
                self.sets
                    .get(key)
                    .map(|s| s.range(*start, *stop, true))
                    .unwrap_or_default(),
            ),
            Command::ZScore { key, member } => match self.sets.get(key).and_then(|s| s.score(member)) {
                Some(score) => Reply::Float(score),
                None => Reply::Nil,
            },
            Command::ZCard { key } => Reply::Int(self.sets.get(key).map_or(0, SortedSet::len) as i64),
            Command::Get { key } => match self.live_string(key, now) {
                Some(s) => Reply::Data(s.value.clone()),
                None => Reply::Nil,
            },
            Command::Exists { keys } => {
                Reply::Int(keys.iter().filter(|k| self.exists(k, now)).count() as i64)
            }
            other => {
                return Err(PageError::Store(format!(
                    "{} is not a read-only command",
                    other.name()
                )))
            }
        };
        Ok(reply)
    }

    fn apply(&mut self, command: Command, now: Instant) -> Result<Reply> {
        if command.is_read_only() {
            return self.query(&command, now);
        }
        self.check_types(&command, now)?;

        let reply = match command {
            Command::ZAdd { key, entries, mode } => {
                self.strings.remove(&key);
                let set = self.sets.entry(key.clone()).or_default();
                let added = entries.iter().filter(|entry| set.insert(entry, mode)).count();
                self.drop_empty_set(&key);
                Reply::Int(added as i64)
            }
            Command::ZRem { key, members } => {
                let removed = match self.sets.get_mut(&key) {
                    Some(set) => members.iter().filter(|m| set.remove(m)).count(),
                    None => 0,
                };
                self.drop_empty_set(&key);
                Reply::Int(removed as i64)
            }
            Command::ZRemRangeByRank { key, start, stop } => {
                let removed = match self.sets.get_mut(&key) {
                    Some(set) => set.remove_range(start, stop),
                    None => 0,
                };
                self.drop_empty_set(&key);
                Reply::Int(removed as i64)
            }
            Command::Set {
                key,
                value,
                expiry,
                mode,
            } => {
                if mode == AddMode::IfAbsent && self.exists(&key, now) {
                    return Ok(Reply::Nil);
                }
                self.sets.remove(&key);
                self.strings.insert(
                    key,
                    StringValue {
                        value,
                        expires_at: expiry.filter(|d| !d.is_zero()).map(|d| now + d),
                    },
                );
                Reply::Ok
            }
            Command::Unlink { keys } | Command::Del { keys } => {
                let removed = keys.iter().filter(|k| self.remove_key(k, now)).count();
                Reply::Int(removed as i64)
            }
            _ => unreachable!("read-only commands are answered by query"),
        };
        Ok(reply)
    }

    fn remove_key(&mut self, key: &str, now: Instant) -> bool {
        let set = self.sets.remove(key).is_some();
        let string = self.strings.remove(key).map_or(false, |s| s.is_live(now));
        set || string
    }

    fn drop_empty_set(&mut self, key: &str) {
        if self.sets.get(key).map_or(false, SortedSet::is_empty) {
            self.sets.remove(key);
        }
    }
}

// =============================================================================
// Sorted Set
// =============================================================================

/// `f64` with a total order, for use as a BTree key
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Members ordered by (score, member), like a Redis zset
#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(Score, String)>,
}

impl SortedSet {
    fn len(&self) -> usize {
        self.scores.len()
    }

    fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Returns true when the member was newly added
    fn insert(&mut self, entry: &IndexEntry, mode: AddMode) -> bool {
        match self.scores.get(&entry.member).copied() {
            Some(_) if mode == AddMode::IfAbsent => false,
            Some(old) => {
                self.ordered.remove(&(Score(old), entry.member.clone()));
                self.ordered.insert((Score(entry.score), entry.member.clone()));
                self.scores.insert(entry.member.clone(), entry.score);
                false
            }
            None => {
                self.ordered.insert((Score(entry.score), entry.member.clone()));
                self.scores.insert(entry.member.clone(), entry.score);
                true
            }
        }
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(Score(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    /// Ascending rank of a member
    fn rank(&self, member: &str) -> Option<usize> {
        let score = self.score(member)?;
        Some(self.ordered.range(..(Score(score), member.to_string())).count())
    }

    fn range(&self, start: i64, stop: i64, reversed: bool) -> Vec<String> {
        let Some((start, stop)) = normalize_range(start, stop, self.len()) else {
            return Vec::new();
        };
        let take = stop - start + 1;
        if reversed {
            self.ordered
                .iter()
                .rev()
                .skip(start)
                .take(take)
                .map(|(_, m)| m.clone())
                .collect()
        } else {
            self.ordered
                .iter()
                .skip(start)
                .take(take)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    fn remove_range(&mut self, start: i64, stop: i64) -> usize {
        let doomed = self.range(start, stop, false);
        for member in &doomed {
            self.remove(member);
        }
        doomed.len()
    }
}

/// Resolve a Redis-style inclusive rank interval (negative counts from the end)
fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}
