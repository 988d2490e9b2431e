//! Key-value settings store and the persisted persona list.
//!
//! The store has no transactional guarantee: the profile list is read,
//! changed in memory and written back whole, so concurrent writers are
//! last-write-wins. The pipeline run guard serializes writers in-process.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::PersonaProfile;

/// Settings key holding the persisted persona list.
pub const PROFILES_KEY: &str = "profiles";

/// File name used by `export_all`.
pub const ALL_PROFILES_FILE: &str = "all-profiles.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No profile at index {index} ({len} stored)")]
    NotFound { index: usize, len: usize },

    #[error("Settings store lock poisoned")]
    LockPoisoned,
}

pub trait SettingsStore: Send + Sync {
    /// Values for the requested keys; absent keys are omitted.
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    /// Merge `values` into the store, replacing existing keys.
    fn set(&self, values: Map<String, Value>) -> Result<(), StoreError>;
}

fn pick(all: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| all.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// JSON file store (`settings.json` in the app data directory).
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(pick(&self.read_all()?, keys))
    }

    fn set(&self, values: Map<String, Value>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut all = self.read_all()?;
        all.extend(values);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        tracing::debug!(path = %self.path.display(), "Settings written");
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(pick(&values, keys))
    }

    fn set(&self, values: Map<String, Value>) -> Result<(), StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .extend(values);
        Ok(())
    }
}

/// Store one settings value.
pub fn set_value(
    store: &dyn SettingsStore,
    key: &str,
    value: impl Into<Value>,
) -> Result<(), StoreError> {
    let mut map = Map::new();
    map.insert(key.to_string(), value.into());
    store.set(map)
}

fn raw_profiles(store: &dyn SettingsStore) -> Result<Vec<Value>, StoreError> {
    let mut values = store.get(&[PROFILES_KEY])?;
    Ok(match values.remove(PROFILES_KEY) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

/// Valid entries paired with their raw position, newest `exportedAt` first.
/// Undated entries sort last; invalid entries are skipped with a warning.
fn sorted_view(items: &[Value]) -> Vec<(usize, PersonaProfile)> {
    let mut view: Vec<(usize, PersonaProfile)> = items
        .iter()
        .enumerate()
        .filter_map(|(i, value)| match PersonaProfile::from_json_value(value.clone()) {
            Ok(profile) => Some((i, profile)),
            Err(e) => {
                tracing::warn!(index = i, error = %e, "Skipping invalid stored profile");
                None
            }
        })
        .collect();
    view.sort_by(|(_, a), (_, b)| b.exported_at().cmp(&a.exported_at()));
    view
}

/// Stored personas, newest `exportedAt` first.
pub fn load_profiles(store: &dyn SettingsStore) -> Result<Vec<PersonaProfile>, StoreError> {
    Ok(sorted_view(&raw_profiles(store)?)
        .into_iter()
        .map(|(_, profile)| profile)
        .collect())
}

/// Append one persona to the stored list.
pub fn append_profile(store: &dyn SettingsStore, profile: &PersonaProfile) -> Result<usize, StoreError> {
    let mut items = raw_profiles(store)?;
    items.push(serde_json::to_value(profile)?);
    let len = items.len();
    set_value(store, PROFILES_KEY, Value::Array(items))?;
    tracing::info!(persona = %profile.name, stored = len, "Profile saved");
    Ok(len)
}

/// Remove the entry at `index` of the sorted view and return it. Every
/// other stored entry, valid or not, is written back untouched.
pub fn delete_profile(store: &dyn SettingsStore, index: usize) -> Result<PersonaProfile, StoreError> {
    let mut items = raw_profiles(store)?;
    let mut view = sorted_view(&items);
    if index >= view.len() {
        return Err(StoreError::NotFound {
            index,
            len: view.len(),
        });
    }
    let (position, removed) = view.swap_remove(index);
    items.remove(position);
    set_value(store, PROFILES_KEY, Value::Array(items))?;
    tracing::info!(persona = %removed.name, index, "Profile deleted");
    Ok(removed)
}

pub fn clear_profiles(store: &dyn SettingsStore) -> Result<(), StoreError> {
    set_value(store, PROFILES_KEY, Value::Array(Vec::new()))?;
    tracing::info!("All profiles cleared");
    Ok(())
}

/// Write one persona as pretty JSON into `dir`; returns the file path.
pub fn export_profile(profile: &PersonaProfile, dir: &Path) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(profile.export_file_name());
    fs::write(&path, serde_json::to_string_pretty(profile)?)?;
    Ok(path)
}

/// Write every persona as one pretty JSON array into `dir`.
pub fn export_all(profiles: &[PersonaProfile], dir: &Path) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(ALL_PROFILES_FILE);
    fs::write(&path, serde_json::to_string_pretty(profiles)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn persona(name: &str, exported_at: Option<&str>) -> PersonaProfile {
        let mut value = json!({
            "name": name,
            "personality": "p",
            "avatarUrl": "https://api.dicebear.com/9.x/micah/svg?seed=x"
        });
        if let Some(ts) = exported_at {
            value["metadata"] = json!({ "exportedAt": ts });
        }
        PersonaProfile::from_json_value(value).unwrap()
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("settings.json"));
        assert!(store.get(&["selectedModel"]).unwrap().is_empty());

        set_value(&store, "selectedModel", "gpt-4o-2024-11-20").unwrap();
        set_value(&store, "openaiKey", "sk-1").unwrap();

        let values = store.get(&["selectedModel", "anthropicKey"]).unwrap();
        assert_eq!(values["selectedModel"], "gpt-4o-2024-11-20");
        assert!(!values.contains_key("anthropicKey"));

        let reopened = JsonFileStore::new(store.path().to_path_buf());
        assert_eq!(reopened.get(&["openaiKey"]).unwrap()["openaiKey"], "sk-1");
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(path).get(&["profiles"]),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn profiles_listed_newest_first() {
        let store = MemoryStore::new();
        append_profile(&store, &persona("Old", Some("2026-01-01T00:00:00Z"))).unwrap();
        append_profile(&store, &persona("Undated", None)).unwrap();
        append_profile(&store, &persona("New", Some("2026-06-01T00:00:00Z"))).unwrap();

        let names: Vec<String> = load_profiles(&store).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["New", "Old", "Undated"]);
    }

    #[test]
    fn invalid_stored_entry_skipped() {
        let mut values = Map::new();
        values.insert(
            PROFILES_KEY.into(),
            json!([{ "name": "broken" }, serde_json::to_value(persona("Ok", None)).unwrap()]),
        );
        let store = MemoryStore::with_values(values);
        let profiles = load_profiles(&store).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "Ok");
    }

    #[test]
    fn delete_uses_sorted_index() {
        let store = MemoryStore::new();
        append_profile(&store, &persona("Old", Some("2026-01-01T00:00:00Z"))).unwrap();
        append_profile(&store, &persona("New", Some("2026-06-01T00:00:00Z"))).unwrap();

        let removed = delete_profile(&store, 0).unwrap();
        assert_eq!(removed.name, "New");
        assert_eq!(load_profiles(&store).unwrap().len(), 1);

        assert!(matches!(
            delete_profile(&store, 5),
            Err(StoreError::NotFound { index: 5, len: 1 })
        ));
    }

    #[test]
    fn delete_keeps_entries_that_fail_validation() {
        let legacy = json!({ "name": "Legacy", "personality": "p", "avatarUrl": "a", "responseChance": 150 });
        let mut values = Map::new();
        values.insert(
            PROFILES_KEY.into(),
            json!([
                serde_json::to_value(persona("A", Some("2026-01-01T00:00:00Z"))).unwrap(),
                serde_json::to_value(persona("B", Some("2025-01-01T00:00:00Z"))).unwrap(),
                legacy.clone(),
            ]),
        );
        let store = MemoryStore::with_values(values);

        assert_eq!(delete_profile(&store, 0).unwrap().name, "A");

        let raw = raw_profiles(&store).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["name"], "B");
        assert_eq!(raw[1], legacy);
    }

    #[test]
    fn clear_empties_list() {
        let store = MemoryStore::new();
        append_profile(&store, &persona("A", None)).unwrap();
        clear_profiles(&store).unwrap();
        assert!(load_profiles(&store).unwrap().is_empty());
    }

    #[test]
    fn exports_write_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let one = persona("Ada Lovelace!", Some("2026-03-01T12:00:00Z"));
        let path = export_profile(&one, dir.path()).unwrap();
        assert!(path.ends_with("ada-lovelace-.json"));
        let back = PersonaProfile::from_json_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, one);

        let all = export_all(&[one.clone(), persona("B", None)], dir.path()).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&fs::read_to_string(all).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
    }
}
