//! Key-value backends and the whole-document store on top of them.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info};

use super::StoreError;
use crate::domain::entities::database::{AppDatabase, DB_KEY};

/// Raw string storage addressed by key
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueBackend for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Exclusive owner of the persisted [`AppDatabase`]
pub struct LocalStore {
    backend: Box<dyn KeyValueBackend>,
    key: String,
    // Held across every load-mutate-save so writers never interleave
    writer: Mutex<()>,
}

impl LocalStore {
    pub fn new(backend: Box<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            key: DB_KEY.to_string(),
            writer: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Current snapshot, seeding and persisting the initial state if absent
    pub fn load(&self) -> Result<AppDatabase, StoreError> {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        self.load_unlocked()
    }

    /// Overwrite the whole persisted document
    pub fn save(&self, db: &AppDatabase) -> Result<(), StoreError> {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        self.save_unlocked(db)
    }

    /// Read-modify-write under the writer lock
    pub fn update<R, F>(&self, mutate: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut AppDatabase) -> R,
    {
        let _guard = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        let mut db = self.load_unlocked()?;
        let result = mutate(&mut db);
        self.save_unlocked(&db)?;
        Ok(result)
    }

    fn load_unlocked(&self) -> Result<AppDatabase, StoreError> {
        match self.backend.get(&self.key)? {
            Some(data) => serde_json::from_str(&data).map_err(|e| {
                error!("Failed to parse stored state under {}: {}", self.key, e);
                StoreError::Corrupt {
                    key: self.key.clone(),
                    reason: e.to_string(),
                }
            }),
            None => {
                info!("No state under {}, writing seed data", self.key);
                let db = AppDatabase::seed();
                self.save_unlocked(&db)?;
                Ok(db)
            }
        }
    }

    fn save_unlocked(&self, db: &AppDatabase) -> Result<(), StoreError> {
        let data =
            serde_json::to_string(db).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.set(&self.key, &data)?;
        debug!("Saved state under {} ({} bytes)", self.key, data.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::user::{AuthProvider, Role, User};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("goldmaster-store-{}", rand::random::<u64>()))
    }

    #[test]
    fn test_first_load_seeds_and_persists() {
        let store = LocalStore::in_memory();
        let first = store.load().unwrap();
        assert_eq!(first.signals.len(), 2);
        assert_eq!(first.ticker_messages, AppDatabase::seed().ticker_messages);
        let second = store.load().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_is_deep_equal() {
        let store = LocalStore::in_memory();
        let mut db = store.load().unwrap();
        db.user = Some(User {
            id: "u1".into(),
            name: "Trader".into(),
            email: "t@example.com".into(),
            avatar: Some("https://example.com/a.png".into()),
            is_vip: true,
            role: Role::User,
            provider: AuthProvider::Google,
            balance: 12.5,
        });
        db.ticker_messages = vec!["a".into(), "b".into()];
        db.settings.auto_vip = true;

        store.save(&db).unwrap();
        assert_eq!(store.load().unwrap(), db);
    }

    #[test]
    fn test_update_persists_mutation() {
        let store = LocalStore::in_memory();
        let count = store
            .update(|db| {
                db.ticker_messages.clear();
                db.ticker_messages.len()
            })
            .unwrap();
        assert_eq!(count, 0);
        assert!(store.load().unwrap().ticker_messages.is_empty());
    }

    #[test]
    fn test_corrupt_document_is_reported_not_overwritten() {
        let backend = MemoryStore::new();
        backend.set(DB_KEY, "{not json").unwrap();
        let store = LocalStore::new(Box::new(backend));
        match store.load() {
            Err(StoreError::Corrupt { key, .. }) => assert_eq!(key, DB_KEY),
            other => panic!("expected corrupt error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = temp_dir();
        let store = LocalStore::new(Box::new(JsonFileStore::open(&dir).unwrap()));
        let mut db = store.load().unwrap();
        db.ticker_messages.insert(0, "GOLD BREAKS 2050".into());
        store.save(&db).unwrap();

        let reopened = LocalStore::new(Box::new(JsonFileStore::open(&dir).unwrap()));
        assert_eq!(reopened.load().unwrap(), db);
        assert!(dir.join(format!("{}.json", DB_KEY)).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_concurrent_updates_do_not_clobber() {
        let store = std::sync::Arc::new(LocalStore::in_memory());
        store.update(|db| db.ticker_messages.clear()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .update(|db| db.ticker_messages.push(format!("msg {}", i)))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.load().unwrap().ticker_messages.len(), 8);
    }
}

