// ============================================
// src/recent.rs
// Recently opened quizzes and how they are stored on disk
// ============================================

use bincode::config::standard;
use bincode::{Decode, Encode};
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::content::QuizMeta;
use crate::error::{QuizError, Result};
use crate::registry::Registry;

/// How many quizzes are remembered.
pub const MAX_RECENTS: usize = 8;

const RECENT_FILE_BIN: &str = "recent_quizzes.bin";
const RECENT_FILE_JSON: &str = "recent_quizzes.json";

/// One opened quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub id: String,
    pub ts: DateTime<Utc>,
}

/// bincode representation (timestamp as epoch milliseconds)
#[derive(Encode, Decode)]
struct RecentEntryBin {
    id: String,
    ts_millis: i64,
}

impl From<&RecentEntry> for RecentEntryBin {
    fn from(entry: &RecentEntry) -> Self {
        Self {
            id: entry.id.clone(),
            ts_millis: entry.ts.timestamp_millis(),
        }
    }
}

impl TryFrom<RecentEntryBin> for RecentEntry {
    type Error = QuizError;

    fn try_from(bin: RecentEntryBin) -> Result<Self> {
        let ts = Utc
            .timestamp_millis_opt(bin.ts_millis)
            .single()
            .ok_or_else(|| QuizError::PersistenceCorrupt(format!("bad timestamp {}", bin.ts_millis)))?;
        Ok(Self { id: bin.id, ts })
    }
}

/// Newest-first list of opened quizzes, at most [`MAX_RECENTS`] long, one entry per id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentHistory {
    entries: Vec<RecentEntry>,
}

impl RecentHistory {
    /// Moves `id` to the front, stamped with the current time.
    pub fn record(&mut self, id: &str) {
        self.record_at(id, Utc::now());
    }

    pub fn record_at(&mut self, id: &str, ts: DateTime<Utc>) {
        self.entries.retain(|e| e.id != id);
        self.entries.insert(
            0,
            RecentEntry {
                id: id.to_string(),
                ts,
            },
        );
        self.entries.truncate(MAX_RECENTS);
    }

    #[cfg(test)]
    pub fn list(&self) -> &[RecentEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&RecentEntry> {
        self.entries.first()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalog entries for the remembered ids, skipping quizzes no longer registered.
    pub fn resolve<'a>(&self, registry: &'a Registry) -> Vec<&'a QuizMeta> {
        self.entries
            .iter()
            .filter_map(|e| registry.meta_by_id(&e.id))
            .collect()
    }

    /// Rebuilds a history from stored entries, keeping the first entry per id.
    fn from_entries(entries: impl IntoIterator<Item = RecentEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .take(MAX_RECENTS)
            .collect();
        Self { entries }
    }

    /// Reads a JSON array leniently: anything that is not an `{id, ts}` object is dropped.
    fn from_json_value(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(QuizError::PersistenceCorrupt("not an array".into()));
        };
        Ok(Self::from_entries(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<RecentEntry>(item).ok()),
        ))
    }
}

// --------------------------------------------------
// Persistence
// --------------------------------------------------

/// Saves and loads the history in a data directory (binary + JSON mirror).
#[derive(Debug, Clone)]
pub struct RecentStore {
    dir: PathBuf,
}

impl RecentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn bin_path(&self) -> PathBuf {
        self.dir.join(RECENT_FILE_BIN)
    }

    fn json_path(&self) -> PathBuf {
        self.dir.join(RECENT_FILE_JSON)
    }

    /// MARK: save (binary + JSON)
    ///
    /// Failures are logged; the history simply is not remembered.
    pub fn save(&self, history: &RecentHistory) {
        if let Err(e) = self.try_save(history) {
            warn!("[recent] could not save history: {e}");
        }
    }

    fn try_save(&self, history: &RecentHistory) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let bin: Vec<RecentEntryBin> = history.entries.iter().map(RecentEntryBin::from).collect();
        let encoded = bincode::encode_to_vec(&bin, standard())
            .map_err(|e| QuizError::PersistenceCorrupt(e.to_string()))?;
        fs::write(self.bin_path(), encoded)?;

        let json = serde_json::to_string_pretty(&history.entries)?;
        fs::write(self.json_path(), json)?;
        Ok(())
    }

    /// MARK: load (binary first, JSON fallback)
    ///
    /// Unreadable or malformed state yields an empty history.
    pub fn load(&self) -> RecentHistory {
        match self.load_bin().or_else(|e| {
            debug!("[recent] binary history unusable ({e}), trying JSON");
            self.load_json()
        }) {
            Ok(history) => history,
            Err(e) => {
                debug!("[recent] starting with empty history ({e})");
                RecentHistory::default()
            }
        }
    }

    fn load_bin(&self) -> Result<RecentHistory> {
        let bytes = fs::read(self.bin_path())?;
        let (bin, _): (Vec<RecentEntryBin>, _) = bincode::decode_from_slice(&bytes, standard())
            .map_err(|e| QuizError::PersistenceCorrupt(e.to_string()))?;
        let entries = bin
            .into_iter()
            .map(RecentEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(RecentHistory::from_entries(entries))
    }

    fn load_json(&self) -> Result<RecentHistory> {
        let text = fs::read_to_string(self.json_path())?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| QuizError::PersistenceCorrupt(e.to_string()))?;
        RecentHistory::from_json_value(value)
    }
}
