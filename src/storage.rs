use crate::errors::StorageError;
use serde_json::Value;
use std::{collections::HashMap, env, fmt, fs, io, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Categories,
    Points,
    Ratings,
    DeletedPoints,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 4] = [
        CollectionKey::Categories,
        CollectionKey::Points,
        CollectionKey::Ratings,
        CollectionKey::DeletedPoints,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKey::Categories => "categories",
            CollectionKey::Points => "points",
            CollectionKey::Ratings => "ratings",
            CollectionKey::DeletedPoints => "deleted_points",
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-collection key-value persistence. Every `set` replaces the entire
/// collection stored under `key`.
pub trait KeyValueStore {
    fn get(&self, key: CollectionKey) -> Result<Option<Value>, StorageError>;

    fn set(&mut self, key: CollectionKey, value: Value) -> Result<(), StorageError>;

    fn remove(&mut self, key: CollectionKey) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<CollectionKey, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: CollectionKey) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(&key).cloned())
    }

    fn set(&mut self, key: CollectionKey, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: CollectionKey) -> Result<(), StorageError> {
        self.entries.remove(&key);
        Ok(())
    }
}

/// One pretty-printed JSON file per collection inside `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path(&self, key: CollectionKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: CollectionKey) -> Result<Option<Value>, StorageError> {
        match fs::read(self.path(key)) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StorageError::Corrupt { key, source }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key, source }),
        }
    }

    fn set(&mut self, key: CollectionKey, value: Value) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(&value)
            .map_err(|source| StorageError::Serialize { key, source })?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, payload).map_err(|source| StorageError::Io { key, source })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { key, source })?;
        Ok(())
    }

    fn remove(&mut self, key: CollectionKey) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { key, source }),
        }
    }
}

pub fn resolve_data_dir() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_DIR") {
        return PathBuf::from(path);
    }

    PathBuf::from("data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unique_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = env::temp_dir();
        path.push(format!("life_journal_store_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn file_store_reads_absent_key_as_none() {
        let store = JsonFileStore::new(unique_dir());
        assert!(store.get(CollectionKey::Ratings).unwrap().is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = unique_dir();
        let mut store = JsonFileStore::new(&dir);
        store
            .set(CollectionKey::Categories, json!([{ "id": "a" }]))
            .unwrap();

        let reopened = JsonFileStore::new(&dir);
        let value = reopened.get(CollectionKey::Categories).unwrap().unwrap();
        assert_eq!(value, json!([{ "id": "a" }]));
        assert!(dir.join("categories.json").exists());
        assert!(!dir.join("categories.json.tmp").exists());
    }

    #[test]
    fn file_store_reports_corrupt_file() {
        let dir = unique_dir();
        fs::write(dir.join("points.json"), b"{not json").unwrap();
        let store = JsonFileStore::new(&dir);

        let err = store.get(CollectionKey::Points).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { key: CollectionKey::Points, .. }));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = unique_dir();
        let mut store = JsonFileStore::new(&dir);
        store.set(CollectionKey::Ratings, json!([])).unwrap();
        store.remove(CollectionKey::Ratings).unwrap();
        store.remove(CollectionKey::Ratings).unwrap();
        assert!(store.get(CollectionKey::Ratings).unwrap().is_none());
    }
}
