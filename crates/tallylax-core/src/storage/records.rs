//! Per-key JSON records shared by the key-value backends.

use crate::{Result, StateKey, TallyError, TrackerState};
use serde::de::DeserializeOwned;

/// Encode one record of the tree as JSON bytes.
pub fn encode_record(state: &TrackerState, key: StateKey) -> Result<Vec<u8>> {
    let encoded = match key {
        StateKey::Team => serde_json::to_vec(state.team()),
        StateKey::Roster => serde_json::to_vec(state.roster()),
        StateKey::Games => serde_json::to_vec(state.games()),
        StateKey::StatsByGame => serde_json::to_vec(state.stats()),
        StateKey::AttendanceByGame => serde_json::to_vec(state.attendance()),
        StateKey::LockedGames => serde_json::to_vec(state.locks()),
    };
    encoded.map_err(|e| TallyError::StoragePersist(format!("encoding '{key}': {e}")))
}

/// Decode one record.
pub fn decode_record<T: DeserializeOwned>(key: StateKey, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| TallyError::CorruptRecord {
        key: key.as_str(),
        reason: e.to_string(),
    })
}

fn field<T, F>(fetch: &mut F, key: StateKey) -> Result<T>
where
    T: DeserializeOwned + Default,
    F: FnMut(StateKey) -> Result<Option<Vec<u8>>>,
{
    match fetch(key)? {
        Some(bytes) => decode_record(key, &bytes),
        None => Ok(T::default()),
    }
}

/// Rebuild the tree from per-key records. `fetch` returns `None` for a
/// record that was never written.
pub fn state_from_records<F>(mut fetch: F) -> Result<TrackerState>
where
    F: FnMut(StateKey) -> Result<Option<Vec<u8>>>,
{
    let state = TrackerState::from_parts(
        field(&mut fetch, StateKey::Team)?,
        field(&mut fetch, StateKey::Roster)?,
        field(&mut fetch, StateKey::Games)?,
        field(&mut fetch, StateKey::StatsByGame)?,
        field(&mut fetch, StateKey::AttendanceByGame)?,
        field(&mut fetch, StateKey::LockedGames)?,
    );
    state
        .validate()
        .map_err(|(key, reason)| TallyError::CorruptRecord {
            key: key.as_str(),
            reason,
        })?;
    Ok(state)
}

// =============================================================================
// TESTS
// =============================================================================
