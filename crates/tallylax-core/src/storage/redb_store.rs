//! redb-backed storage: one table, one JSON record per state key.
//!
//! redb gives us:
//! - ACID transactions (a persist writes all touched keys or none)
//! - Crash safety (copy-on-write B-trees)

use super::{Storage, encode_record, state_from_records};
use crate::{Result, StateKey, TallyError, TrackerState};
use redb::{Database, ReadableDatabase, TableDefinition};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// `state` table: record name -> JSON bytes.
const STATE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("state");

fn load_err(e: impl Display) -> TallyError {
    TallyError::StorageLoad(e.to_string())
}

fn persist_err(e: impl Display) -> TallyError {
    TallyError::StoragePersist(e.to_string())
}

/// Durable state in an embedded redb database file.
pub struct RedbStorage {
    db: Database,
    path: PathBuf,
}

impl RedbStorage {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(load_err)?;

        // Create the table up front so read transactions can always open it.
        let txn = db.begin_write().map_err(load_err)?;
        txn.open_table(STATE_TABLE).map_err(load_err)?;
        txn.commit().map_err(load_err)?;

        Ok(Self { db, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the records currently stored, in key order.
    pub fn stored_keys(&self) -> Result<Vec<StateKey>> {
        let txn = self.db.begin_read().map_err(load_err)?;
        let table = txn.open_table(STATE_TABLE).map_err(load_err)?;
        let mut keys = Vec::new();
        for key in StateKey::ALL {
            if table.get(key.as_str()).map_err(load_err)?.is_some() {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

impl std::fmt::Debug for RedbStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStorage")
            .field("path", &self.path)
            .finish()
    }
}

impl Storage for RedbStorage {
    fn load(&self) -> Result<TrackerState> {
        let txn = self.db.begin_read().map_err(load_err)?;
        let table = txn.open_table(STATE_TABLE).map_err(load_err)?;
        state_from_records(|key| {
            let value = table.get(key.as_str()).map_err(load_err)?;
            Ok(value.map(|guard| guard.value().to_vec()))
        })
    }

    fn persist(&mut self, state: &TrackerState, keys: &[StateKey]) -> Result<()> {
        let encoded = keys
            .iter()
            .map(|key| -> Result<(StateKey, Vec<u8>)> { Ok((*key, encode_record(state, *key)?)) })
            .collect::<Result<Vec<_>>>()?;

        let txn = self.db.begin_write().map_err(persist_err)?;
        {
            let mut table = txn.open_table(STATE_TABLE).map_err(persist_err)?;
            for (key, bytes) in &encoded {
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(persist_err)?;
            }
        }
        txn.commit().map_err(persist_err)
    }

    fn clear(&mut self) -> Result<()> {
        let txn = self.db.begin_write().map_err(persist_err)?;
        {
            let mut table = txn.open_table(STATE_TABLE).map_err(persist_err)?;
            for key in StateKey::ALL {
                table.remove(key.as_str()).map_err(persist_err)?;
            }
        }
        txn.commit().map_err(persist_err)
    }
}
