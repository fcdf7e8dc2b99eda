//! # Storage Module
//!
//! The durable copy of the state tree.
//!
//! The in-memory [`TrackerState`] is the source of truth for a session. A
//! [`Storage`] backend mirrors it: it is loaded once at startup and written
//! after every mutation with the keys that mutation touched. A failed write
//! is reported to the caller and never rolls the in-memory state back.
//!
//! Backends:
//! - [`MemoryStorage`]: per-key JSON records in memory (tests, dry runs)
//! - [`RedbStorage`]: per-key JSON records in an embedded redb database

mod memory;
mod records;
mod redb_store;

pub use memory::MemoryStorage;
pub use records::{decode_record, encode_record, state_from_records};
pub use redb_store::RedbStorage;

use crate::{Result, StateKey, TrackerState};

/// A durable mirror of the state tree.
pub trait Storage {
    /// Read the stored tree. Missing records fall back to empty defaults;
    /// a record that exists but does not decode is an error.
    fn load(&self) -> Result<TrackerState>;

    /// Write the given records of `state`.
    fn persist(&mut self, state: &TrackerState, keys: &[StateKey]) -> Result<()>;

    /// Remove every stored record.
    fn clear(&mut self) -> Result<()>;
}
