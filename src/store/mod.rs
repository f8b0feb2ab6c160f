//! Snapshot store — last-seen state per tracked page.
//!
//! One JSON record per page under the state directory, addressed by a
//! SHA-256 digest of the canonical URL so records survive restarts without
//! depending on filesystem-unsafe URL characters. Single process, single
//! writer, sequential access: no locking.

use crate::error::MonitorError;
use crate::extract::Snapshot;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// The persisted record for one tracked page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    /// Canonical page URL, kept for the `state list` command.
    pub url: String,
    /// The calendar date the page tracks.
    pub date: NaiveDate,
    /// Last observed availability.
    pub available: bool,
    /// Last observed fingerprint.
    pub fingerprint: String,
    /// Last-seen item names.
    pub items: Vec<String>,
    /// When the record was written.
    pub checked_at: DateTime<Utc>,
}

/// File-backed snapshot store.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open the store, creating its directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Deterministic page key for a canonical URL.
    pub fn page_key(url: &str) -> String {
        format!("{:x}", Sha256::digest(url.as_bytes()))
    }

    fn record_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::page_key(url)))
    }

    /// Load the last-seen state for a page. Absent or unreadable records
    /// both come back as `None` — a corrupt record means "first encounter".
    pub fn load(&self, url: &str) -> Option<PersistedState> {
        let path = self.record_path(url);
        let data = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(url, error = %e, "discarding corrupt state record");
                None
            }
        }
    }

    /// Overwrite the record for a page, unconditionally.
    pub fn save(
        &self,
        url: &str,
        date: NaiveDate,
        snapshot: &Snapshot,
    ) -> Result<(), MonitorError> {
        let state = PersistedState {
            url: url.to_string(),
            date,
            available: snapshot.available,
            fingerprint: snapshot.fingerprint.clone(),
            items: snapshot.items.iter().map(|i| i.name.clone()).collect(),
            checked_at: Utc::now(),
        };
        let data = serde_json::to_string_pretty(&state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(self.record_path(url), data)?;
        Ok(())
    }

    /// All records currently on disk, ordered by date.
    pub fn list(&self) -> Result<Vec<PersistedState>, MonitorError> {
        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(state) = read_record(&path) {
                records.push(state);
            }
        }
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    /// Delete all records, or only the record for one date. Returns how many
    /// files were removed.
    pub fn clear(&self, date: Option<NaiveDate>) -> Result<usize, MonitorError> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(wanted) = date {
                match read_record(&path) {
                    Some(state) if state.date == wanted => {}
                    _ => continue,
                }
            }
            std::fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn read_record(path: &Path) -> Option<PersistedState> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}
