//! Session Module
//!
//! Request builders derived from a [`Collection`](crate::Collection).
//!
//! ## Lifecycle
//! ```text
//! collection.read()  ─▶ Reader  ─▶ page / after / ids / only_meta / with ─▶ exec() ─▶ Vec<ItemResult>
//! collection.write() ─▶ Writer  ─▶ value / values / record / only_meta / with ─▶ exec() ─▶ ()
//! collection.delete(ids) ─▶ Deleter ─▶ only_meta / with ─▶ exec() ─▶ ()
//! ```
//! Each session owns its request fields and a snapshot of the collection;
//! `exec` consumes it.

mod deleter;
mod reader;
mod writer;

pub use deleter::Deleter;
pub use reader::Reader;
pub use writer::Writer;
