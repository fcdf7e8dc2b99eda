//! In-memory backend.

use super::{Storage, encode_record, state_from_records};
use crate::{Result, StateKey, TallyError, TrackerState};
use std::collections::BTreeMap;

/// Keeps per-key JSON records in a map.
///
/// `fail_writes` makes every `persist` fail, the way a full disk or an
/// exceeded quota would.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: BTreeMap<StateKey, Vec<u8>>,
    fail_writes: bool,
    writes: u64,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Raw stored record, if any.
    #[must_use]
    pub fn record(&self, key: StateKey) -> Option<&[u8]> {
        self.records.get(&key).map(Vec::as_slice)
    }

    /// Number of successful `persist` calls.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Store a raw record, bypassing encoding.
    pub fn put_raw(&mut self, key: StateKey, bytes: impl Into<Vec<u8>>) {
        self.records.insert(key, bytes.into());
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<TrackerState> {
        state_from_records(|key| Ok(self.records.get(&key).cloned()))
    }

    fn persist(&mut self, state: &TrackerState, keys: &[StateKey]) -> Result<()> {
        if self.fail_writes {
            return Err(TallyError::StoragePersist(
                "storage quota exceeded".to_string(),
            ));
        }
        // Encode everything first so a failure leaves no partial write.
        let encoded = keys
            .iter()
            .map(|key| -> Result<(StateKey, Vec<u8>)> { Ok((*key, encode_record(state, *key)?)) })
            .collect::<Result<Vec<_>>>()?;
        self.records.extend(encoded);
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.records.clear();
        Ok(())
    }
}
