use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    db::file::write_atomic,
    error::{AppError, AppResult},
    models::WatchlistEntry,
};

/// Namespace key the watchlist is persisted under
pub const WATCHLIST_KEY: &str = "cineseek_watchlist";

/// Client-local string storage scoped to one profile
pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> AppResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> AppResult<()>;
}

/// One JSON file per key inside a data directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        write_atomic(&self.path(key), value.as_bytes())?;
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        (**self).write(key, value)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Watchlist operations available to the UI
///
/// All operations are local and synchronous. At most one entry exists per id.
pub trait WatchlistStore: Send + Sync {
    /// Appends the entry unless the id is already present; returns whether it was added
    fn add(&self, id: &str, title: &str) -> bool;

    /// Removes the entry with this id; returns whether one was removed
    fn remove(&self, id: &str) -> bool;

    fn clear(&self);

    /// Entries in insertion order
    fn list(&self) -> Vec<WatchlistEntry>;

    fn contains(&self, id: &str) -> bool;
}

/// Watchlist persisted as a JSON array of `{id, title}` under [`WATCHLIST_KEY`]
///
/// The in-memory copy is authoritative for this client. While the last write
/// succeeded, every operation re-reads storage first so writes from another
/// client sharing it are picked up (last write wins). After a failed write the
/// copy holds changes storage never saw, so it is kept until a write lands.
pub struct PersistentWatchlist<S: Storage> {
    storage: S,
    state: Mutex<WatchState>,
}

struct WatchState {
    entries: Vec<WatchlistEntry>,
    /// Storage holds exactly `entries`
    in_sync: bool,
}

impl PersistentWatchlist<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl PersistentWatchlist<FileStorage> {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStorage::new(dir))
    }
}

impl<S: Storage> PersistentWatchlist<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: Mutex::new(WatchState {
                entries: Vec::new(),
                in_sync: true,
            }),
        }
    }

    /// Locks the state after merging in what storage currently holds
    fn current(&self) -> MutexGuard<'_, WatchState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.in_sync {
            if let Some(entries) = self.load() {
                state.entries = entries;
            }
        }
        state
    }

    /// Stored entries; `None` when storage cannot be read
    ///
    /// Missing or malformed state loads as an empty list.
    fn load(&self) -> Option<Vec<WatchlistEntry>> {
        let raw = match self.storage.read(WATCHLIST_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, "Watchlist storage unreadable, keeping local copy");
                return None;
            }
        };

        let entries: Vec<WatchlistEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Watchlist state malformed, starting empty");
                return Some(Vec::new());
            }
        };

        let mut seen = HashSet::new();
        Some(
            entries
                .into_iter()
                .filter(|entry| seen.insert(entry.id.clone()))
                .collect(),
        )
    }

    /// Returns whether storage now holds `entries`
    fn save(&self, entries: &[WatchlistEntry]) -> bool {
        let result = serde_json::to_string(entries)
            .map_err(AppError::from)
            .and_then(|json| self.storage.write(WATCHLIST_KEY, &json));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, entries = entries.len(), "Failed to persist watchlist");
                false
            }
        }
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut Vec<WatchlistEntry>) -> (bool, R)) -> R {
        let mut state = self.current();
        let (changed, result) = apply(&mut state.entries);
        if changed {
            let saved = self.save(&state.entries);
            state.in_sync = saved;
        }
        result
    }
}

impl<S: Storage> WatchlistStore for PersistentWatchlist<S> {
    fn add(&self, id: &str, title: &str) -> bool {
        self.mutate(|entries| {
            if entries.iter().any(|e| e.id == id) {
                return (false, false);
            }
            entries.push(WatchlistEntry::new(id, title));
            (true, true)
        })
    }

    fn remove(&self, id: &str) -> bool {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            let removed = entries.len() != before;
            (removed, removed)
        })
    }

    fn clear(&self) {
        self.mutate(|entries| {
            entries.clear();
            (true, ())
        })
    }

    fn list(&self) -> Vec<WatchlistEntry> {
        self.current().entries.clone()
    }

    fn contains(&self, id: &str) -> bool {
        self.current().entries.iter().any(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(store: &dyn WatchlistStore) -> Vec<String> {
        store.list().into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = PersistentWatchlist::in_memory();
        assert!(store.add("tt1", "Alien"));
        assert!(!store.add("tt1", "Alien (again)"));

        assert_eq!(store.list(), vec![WatchlistEntry::new("tt1", "Alien")]);
    }

    #[test]
    fn test_no_duplicates_across_mixed_operations() {
        let store = PersistentWatchlist::in_memory();
        let ops = [
            ("add", "a"), ("add", "b"), ("add", "a"), ("remove", "b"),
            ("add", "b"), ("add", "c"), ("remove", "x"), ("add", "c"),
        ];

        for (op, id) in ops {
            match op {
                "add" => {
                    store.add(id, id);
                }
                _ => {
                    store.remove(id);
                }
            }
            let listed = ids(&store);
            let unique: HashSet<_> = listed.iter().collect();
            assert_eq!(unique.len(), listed.len());
        }

        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_and_contains() {
        let store = PersistentWatchlist::in_memory();
        store.add("tt1", "Alien");
        store.add("tt2", "Aliens");

        assert!(store.remove("tt1"));
        assert!(!store.remove("tt1"));
        assert!(!store.contains("tt1"));
        assert!(store.contains("tt2"));
    }

    #[test]
    fn test_clear_empties_store() {
        let store = PersistentWatchlist::in_memory();
        store.add("tt1", "Alien");
        store.clear();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_malformed_state_is_empty() {
        let storage = MemoryStorage::new();
        storage.write(WATCHLIST_KEY, "{not json").unwrap();
        let store = PersistentWatchlist::new(storage);

        assert!(store.list().is_empty());
        assert!(store.add("tt1", "Alien"));
        assert_eq!(ids(&store), vec!["tt1"]);
    }

    #[test]
    fn test_duplicate_ids_in_persisted_state_collapse() {
        let storage = MemoryStorage::new();
        storage
            .write(
                WATCHLIST_KEY,
                r#"[{"id":"tt1","title":"First"},{"id":"tt1","title":"Second"}]"#,
            )
            .unwrap();
        let store = PersistentWatchlist::new(storage);

        assert_eq!(store.list(), vec![WatchlistEntry::new("tt1", "First")]);
    }

    /// Storage that reads fine but refuses every write
    struct ReadOnlyStorage;

    impl Storage for ReadOnlyStorage {
        fn read(&self, _key: &str) -> AppResult<Option<String>> {
            Ok(None)
        }

        fn write(&self, _key: &str, _value: &str) -> AppResult<()> {
            Err(std::io::Error::new(ErrorKind::PermissionDenied, "read-only profile").into())
        }
    }

    #[test]
    fn test_failed_write_keeps_local_copy() {
        let store = PersistentWatchlist::new(ReadOnlyStorage);

        assert!(store.add("tt1", "Alien"));
        assert!(store.contains("tt1"));
        assert_eq!(store.list(), vec![WatchlistEntry::new("tt1", "Alien")]);

        assert!(!store.add("tt1", "Alien"));
        assert!(store.add("tt2", "Aliens"));
        assert!(store.remove("tt1"));
        assert_eq!(ids(&store), vec!["tt2"]);

        store.clear();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_picks_up_writes_from_another_client() {
        let storage = Arc::new(MemoryStorage::new());
        let ours = PersistentWatchlist::new(storage.clone());
        let theirs = PersistentWatchlist::new(storage);

        ours.add("tt1", "Alien");
        theirs.add("tt2", "Aliens");
        assert_eq!(ids(&ours), vec!["tt1", "tt2"]);

        theirs.clear();
        assert!(!ours.contains("tt1"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = PersistentWatchlist::open(dir.path());
            store.add("tt0133093", "The Matrix");
            store.add("tt0234215", "The Matrix Reloaded");
        }

        let reopened = PersistentWatchlist::open(dir.path());
        assert_eq!(ids(&reopened), vec!["tt0133093", "tt0234215"]);

        let raw = fs::read_to_string(dir.path().join("cineseek_watchlist.json")).unwrap();
        assert!(raw.starts_with(r#"[{"id":"tt0133093","title":"The Matrix"}"#));
    }

    #[test]
    fn test_file_store_first_run_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistentWatchlist::open(dir.path().join("missing"));
        assert!(store.list().is_empty());
    }
}
