//! Store Module
//!
//! The external ordered-set + key/value store the engine drives.
//!
//! ## Responsibilities
//! - Rank and range queries over an ordered set, absent distinguishable from rank 0
//! - Per-key score / value lookups batched into one pipelined round trip
//! - Add / add-if-absent, set / set-if-absent with expiry, removal, unlink
//! - Atomic multi-command transactions
//!
//! ## Batches
//! ```text
//! pipeline:     [cmd, cmd, cmd] ──▶ [Ok(reply) | Err(e), ...]   (independent)
//! transaction:  [cmd, cmd, cmd] ──▶ Ok([reply, ...]) | Err(e)   (all-or-nothing)
//! ```

mod command;
mod memory;

use crate::context::Context;
use crate::error::{PageError, Result};

pub use command::{AddMode, Command, Reply};
pub use memory::MemoryStore;

/// An ordered-set + key/value store
///
/// Implementations must honor the context on every call.
pub trait Store: Send + Sync {
    /// Execute one command
    fn execute(&self, ctx: &Context, command: Command) -> Result<Reply> {
        self.pipeline(ctx, vec![command])?
            .pop()
            .unwrap_or_else(|| Err(PageError::Store("empty pipeline reply".to_string())))
    }

    /// Execute commands in one round trip without atomicity
    ///
    /// The outer error is a transport failure of the whole batch. Each inner
    /// result belongs to the command at the same index.
    fn pipeline(&self, ctx: &Context, commands: Vec<Command>) -> Result<Vec<Result<Reply>>>;

    /// Execute commands atomically: either every command applies or none does
    fn transaction(&self, ctx: &Context, commands: Vec<Command>) -> Result<Vec<Reply>>;
}

/// Commands queued for one atomic transaction
#[derive(Debug, Default)]
pub struct Transaction {
    commands: Vec<Command>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Send the queued commands; an empty transaction skips the round trip
    pub fn exec(self, store: &dyn Store, ctx: &Context) -> Result<Vec<Reply>> {
        if self.commands.is_empty() {
            return Ok(Vec::new());
        }
        ctx.check()?;
        store.transaction(ctx, self.commands)
    }
}
