//! Persisted client-side state.
//!
//! Everything the browser original kept in ambient storage lives here under
//! one explicit directory (default `~/.yarimausu`), injected into the
//! coordinator at construction so tests can point it at a scratch dir:
//! per-list snapshot cache, the actor's display name, and the
//! recently-opened-lists history. The remote store stays authoritative;
//! these files are best-effort replicas.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::task::ListSnapshot;

/// Snapshots older than this are treated as misses.
const CACHE_FRESH_MINUTES: i64 = 10;
/// Most-recently-opened history cap.
const HISTORY_LIMIT: usize = 10;
/// History entries untouched for this long are pruned.
const HISTORY_EXPIRY_DAYS: i64 = 30;

/// A cached list snapshot with its fetch/mutation timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedSnapshot {
    snapshot: ListSnapshot,
    timestamp: DateTime<Utc>,
}

/// One recently-opened list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub last_accessed: DateTime<Utc>,
}

/// Handle to the client state directory.
pub struct ClientState {
    dir: PathBuf,
}

impl ClientState {
    /// Open (creating if needed) the state directory.
    pub fn new(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(dir.join("cache"))?;
        Ok(ClientState { dir })
    }

    /// Default state directory under the user's home.
    pub fn default_dir() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".yarimausu")
    }

    // --- actor name -------------------------------------------------------

    /// The recorded actor name; empty when none has been set.
    pub fn user_name(&self) -> String {
        fs::read_to_string(self.dir.join("username"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    pub fn set_user_name(&self, name: &str) -> io::Result<()> {
        atomic_write(&self.dir.join("username"), name.trim().as_bytes())
    }

    // --- snapshot cache ---------------------------------------------------

    fn cache_file(&self, list_id: &str) -> PathBuf {
        // List ids are UUIDs; strip anything that isn't filename-safe anyway.
        let safe: String = list_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        self.dir.join("cache").join(format!("{safe}.json"))
    }

    /// Cached snapshot for a list, if present and within the freshness
    /// window. Malformed cache content is a miss, not an error.
    pub fn fresh_snapshot(&self, list_id: &str) -> Option<ListSnapshot> {
        let cached: CachedSnapshot = read_json(&self.cache_file(list_id))?;
        if Utc::now() - cached.timestamp > Duration::minutes(CACHE_FRESH_MINUTES) {
            return None;
        }
        Some(cached.snapshot)
    }

    /// Refresh the cache entry in place with a fresh timestamp. Cache write
    /// failures are logged and swallowed: the in-memory copy is already
    /// correct and the next read falls back to the network.
    pub fn store_snapshot(&self, list_id: &str, snapshot: &ListSnapshot) {
        let entry = CachedSnapshot {
            snapshot: snapshot.clone(),
            timestamp: Utc::now(),
        };
        if let Err(err) = write_json(&self.cache_file(list_id), &entry) {
            warn!(list_id, error = %err, "failed to write snapshot cache");
        }
    }

    /// Drop a cached snapshot (used after a list turns out to be deleted).
    pub fn evict_snapshot(&self, list_id: &str) {
        let _ = fs::remove_file(self.cache_file(list_id));
    }

    // --- recently-opened history -----------------------------------------

    fn history_file(&self) -> PathBuf {
        self.dir.join("history.json")
    }

    /// Recently opened lists, newest first, pruned of expired entries.
    pub fn history(&self) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> =
            read_json(&self.history_file()).unwrap_or_default();
        let cutoff = Utc::now() - Duration::days(HISTORY_EXPIRY_DAYS);
        entries.retain(|e| e.last_accessed >= cutoff);
        entries.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        entries.truncate(HISTORY_LIMIT);
        entries
    }

    /// Record a successful list load, bumping or inserting its entry.
    pub fn touch_history(&self, list_id: &str, title: &str) {
        let mut entries = self.history();
        entries.retain(|e| e.id != list_id);
        entries.insert(
            0,
            HistoryEntry {
                id: list_id.to_string(),
                title: title.to_string(),
                last_accessed: Utc::now(),
            },
        );
        entries.truncate(HISTORY_LIMIT);
        if let Err(err) = write_json(&self.history_file(), &entries) {
            warn!(error = %err, "failed to write history");
        }
    }

    pub fn remove_history(&self, list_id: &str) {
        let mut entries = self.history();
        entries.retain(|e| e.id != list_id);
        if let Err(err) = write_json(&self.history_file(), &entries) {
            warn!(error = %err, "failed to write history");
        }
    }

    pub fn clear_history(&self) {
        let _ = fs::remove_file(self.history_file());
    }
}

/// Parse a JSON file, treating a missing or malformed file as absent.
fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let mut buf = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut buf))
        .ok()?;
    match serde_json::from_str(&buf) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "discarding malformed state file");
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let data = serde_json::to_string(value).map_err(io::Error::other)?;
    atomic_write(path, data.as_bytes())
}

/// Atomic-ish write via temp + rename.
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(data)?;
    f.flush()?;
    fs::rename(tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;
    use crate::task::{Task, TaskList};
    use chrono::TimeZone;

    fn snapshot(list_id: &str) -> ListSnapshot {
        let t0 = Utc.timestamp_opt(0, 0).single().unwrap();
        ListSnapshot {
            task_list: TaskList {
                id: list_id.into(),
                title: "Groceries".into(),
                description: None,
                created_at: t0,
                updated_at: t0,
            },
            tasks: vec![Task {
                id: "t1".into(),
                list_id: list_id.into(),
                title: "Buy milk".into(),
                description: None,
                status: Status::NotStarted,
                assigned_to: String::new(),
                completed: false,
                progress_percentage: 0,
                priority: Some(1.0),
                position: 0,
                created_at: t0,
                updated_at: t0,
            }],
        }
    }

    fn state() -> (tempfile::TempDir, ClientState) {
        let dir = tempfile::tempdir().unwrap();
        let state = ClientState::new(dir.path().to_path_buf()).unwrap();
        (dir, state)
    }

    #[test]
    fn stored_snapshot_is_fresh() {
        let (_dir, state) = state();
        assert!(state.fresh_snapshot("abc").is_none());
        state.store_snapshot("abc", &snapshot("abc"));
        let cached = state.fresh_snapshot("abc").unwrap();
        assert_eq!(cached.task_list.title, "Groceries");
    }

    #[test]
    fn stale_snapshot_is_a_miss() {
        let (_dir, state) = state();
        let entry = CachedSnapshot {
            snapshot: snapshot("abc"),
            timestamp: Utc::now() - Duration::minutes(CACHE_FRESH_MINUTES + 1),
        };
        write_json(&state.cache_file("abc"), &entry).unwrap();
        assert!(state.fresh_snapshot("abc").is_none());
    }

    #[test]
    fn corrupt_cache_is_a_miss() {
        let (_dir, state) = state();
        fs::write(state.cache_file("abc"), b"{not json").unwrap();
        assert!(state.fresh_snapshot("abc").is_none());
    }

    #[test]
    fn user_name_round_trips() {
        let (_dir, state) = state();
        assert_eq!(state.user_name(), "");
        state.set_user_name("  mika ").unwrap();
        assert_eq!(state.user_name(), "mika");
    }

    #[test]
    fn history_caps_at_limit_and_dedupes() {
        let (_dir, state) = state();
        for i in 0..15 {
            state.touch_history(&format!("list-{i}"), "t");
        }
        state.touch_history("list-3", "t again");
        let entries = state.history();
        assert_eq!(entries.len(), HISTORY_LIMIT);
        assert_eq!(entries[0].id, "list-3");
        assert_eq!(entries[0].title, "t again");
        assert_eq!(entries.iter().filter(|e| e.id == "list-3").count(), 1);
    }

    #[test]
    fn history_prunes_expired_entries() {
        let (_dir, state) = state();
        let entries = vec![
            HistoryEntry {
                id: "old".into(),
                title: "old".into(),
                last_accessed: Utc::now() - Duration::days(HISTORY_EXPIRY_DAYS + 1),
            },
            HistoryEntry {
                id: "new".into(),
                title: "new".into(),
                last_accessed: Utc::now(),
            },
        ];
        write_json(&state.history_file(), &entries).unwrap();
        let seen = state.history();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, "new");
    }

    #[test]
    fn history_remove_and_clear() {
        let (_dir, state) = state();
        state.touch_history("a", "A");
        state.touch_history("b", "B");
        state.remove_history("a");
        assert_eq!(state.history().len(), 1);
        state.clear_history();
        assert!(state.history().is_empty());
    }
}
