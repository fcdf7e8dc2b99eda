//! Binary snapshot format.
//!
//! Layout: `TLAX` magic, one version byte, then the postcard-encoded tree.

use crate::{Result, TallyError, TrackerState};

/// File magic.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"TLAX";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + 1;

/// Encode the tree as a snapshot.
pub fn encode_snapshot(state: &TrackerState) -> Result<Vec<u8>> {
    let payload =
        postcard::to_allocvec(state).map_err(|e| TallyError::StoragePersist(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&SNAPSHOT_MAGIC);
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(&payload);
    Ok(out)
}

fn corrupt(reason: impl Into<String>) -> TallyError {
    TallyError::CorruptRecord {
        key: "snapshot",
        reason: reason.into(),
    }
}

/// Decode a snapshot, checking header and structure.
pub fn decode_snapshot(bytes: &[u8]) -> Result<TrackerState> {
    if bytes.len() < HEADER_LEN || bytes[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(corrupt("missing TLAX header"));
    }
    let version = bytes[SNAPSHOT_MAGIC.len()];
    if version != SNAPSHOT_VERSION {
        return Err(corrupt(format!(
            "unsupported snapshot version {version} (expected {SNAPSHOT_VERSION})"
        )));
    }

    let (state, rest): (TrackerState, _) =
        postcard::take_from_bytes(&bytes[HEADER_LEN..]).map_err(|e| corrupt(e.to_string()))?;
    if !rest.is_empty() {
        return Err(corrupt(format!("{} trailing bytes", rest.len())));
    }
    state
        .validate()
        .map_err(|(key, reason)| corrupt(format!("{key}: {reason}")))?;
    Ok(state)
}

// =============================================================================
// TESTS
// =============================================================================
