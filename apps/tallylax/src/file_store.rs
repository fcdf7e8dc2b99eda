//! Snapshot file backend.
//!
//! The whole tree lives in one binary snapshot. Every write replaces the
//! file atomically: the snapshot goes to a sibling temp file first and is
//! then renamed over the target.

use std::path::{Path, PathBuf};
use tallylax_core::formats::{decode_snapshot, encode_snapshot};
use tallylax_core::{Result, StateKey, Storage, TallyError, TrackerState};

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<TrackerState> {
        if !self.path.exists() {
            return Ok(TrackerState::new());
        }
        let bytes = std::fs::read(&self.path).map_err(|e| {
            TallyError::StorageLoad(format!("reading {}: {e}", self.path.display()))
        })?;
        decode_snapshot(&bytes)
    }

    /// The snapshot always holds the whole tree, so `keys` only says that
    /// something changed.
    fn persist(&mut self, state: &TrackerState, _keys: &[StateKey]) -> Result<()> {
        let bytes = encode_snapshot(state)?;
        let temp = self.temp_path();
        std::fs::write(&temp, &bytes).map_err(|e| {
            TallyError::StoragePersist(format!("writing {}: {e}", temp.display()))
        })?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            TallyError::StoragePersist(format!("replacing {}: {e}", self.path.display()))
        })
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TallyError::StoragePersist(format!(
                "removing {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallylax_core::{NewPlayer, Role, Tracker};

    #[test]
    fn missing_file_loads_default() {
        let temp = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(temp.path().join("none.snap"));
        assert_eq!(storage.load().unwrap(), TrackerState::new());
    }

    #[test]
    fn persist_then_reload() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("team.snap");
        let mut tracker = Tracker::open(FileStorage::new(&path)).unwrap();
        let _ = tracker.set_team_name("Hawks");
        let _ = tracker
            .add_player(5, NewPlayer::new("Kit", "30", Role::Goalie))
            .unwrap();

        assert!(path.exists());
        assert!(!FileStorage::new(&path).temp_path().exists());

        let reloaded = FileStorage::new(&path).load().unwrap();
        assert_eq!(&reloaded, tracker.state());
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("team.snap");
        std::fs::write(&path, b"definitely not a snapshot").unwrap();

        let err = FileStorage::new(&path).load().unwrap_err();
        assert!(matches!(err, TallyError::CorruptRecord { key: "snapshot", .. }));
    }

    #[test]
    fn clear_removes_file_and_tolerates_absence() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("team.snap");
        let mut storage = FileStorage::new(&path);
        storage.persist(&TrackerState::new(), &StateKey::ALL).unwrap();
        assert!(path.exists());

        storage.clear().unwrap();
        assert!(!path.exists());
        storage.clear().unwrap();
    }
}
