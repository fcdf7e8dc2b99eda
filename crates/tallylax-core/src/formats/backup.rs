//! JSON backup document.
//!
//! The document is a single object with the six state keys:
//!
//! ```text
//! {
//!   "team": { "name": "My Team" },
//!   "roster": [ { "id": "...", "name": "...", "number": "12", "role": "runner" } ],
//!   "games": [ { "id": "...", "opponent": "...", "date": "2025-04-12" } ],
//!   "statsByGame": { "<gameId>": { "<playerId>": { "Goals": 2, ... } } },
//!   "attendanceByGame": { "<gameId>": { "<playerId>": true } },
//!   "lockedGames": { "<gameId>": true }
//! }
//! ```
//!
//! Import is all-or-nothing: the document is fully parsed and checked into a
//! fresh tree before anything is replaced.

use crate::{Result, StateKey, TallyError, TrackerState};
use serde_json::Value;

/// Default file name for exported backups.
pub const BACKUP_FILE_NAME: &str = "tallylax-backup.json";

/// Serialize the whole tree as a pretty-printed backup document.
pub fn export_json(state: &TrackerState) -> Result<String> {
    serde_json::to_string_pretty(state).map_err(|e| TallyError::Export(e.to_string()))
}

fn malformed(e: impl std::fmt::Display) -> TallyError {
    TallyError::MalformedImport(e.to_string())
}

/// Parse a backup document into a new tree.
///
/// Missing (or `null`) keys fall back to their empty defaults and unknown
/// top-level keys are ignored. Anything else that does not fit the shape
/// fails the whole import with [`TallyError::MalformedImport`].
pub fn import_json(document: &str) -> Result<TrackerState> {
    let mut value: Value = serde_json::from_str(document).map_err(malformed)?;

    let Some(object) = value.as_object_mut() else {
        return Err(TallyError::MalformedImport(
            "expected a JSON object at the top level".to_string(),
        ));
    };
    for key in StateKey::ALL {
        if object.get(key.as_str()).is_some_and(Value::is_null) {
            object.remove(key.as_str());
        }
    }

    let state: TrackerState = serde_json::from_value(value).map_err(malformed)?;
    state
        .validate()
        .map_err(|(key, reason)| TallyError::MalformedImport(format!("{key}: {reason}")))?;
    Ok(state)
}

// =============================================================================
// TESTS
// =============================================================================
