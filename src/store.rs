use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ONBOARDING_FILE: &str = "onboarding.json";
pub const WARNINGS_FILE: &str = "warnings.json";
pub const RANKS_FILE: &str = "ranks.json";

/// Whether a member finished the rule-acceptance flow, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingRecord {
    pub completed: bool,
    /// RFC 3339 UTC timestamp of completion.
    pub timestamp: String,
}

/// A flat persisted mapping from member id to a small value, kept fully in
/// memory and rewritten as a whole JSON document on save.
///
/// The three stores (onboarding, warnings, ranks) are independent; a member
/// may exist in one and not another. Each store lives behind its own
/// `Arc<Mutex<_>>` in [`crate::discord::Data`], so mutations are serialized
/// through a single writer.
#[derive(Debug)]
pub struct RecordStore<V> {
    path: PathBuf,
    records: HashMap<String, V>,
}

impl<V> RecordStore<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Reads the store from disk. A missing file is an empty store; a file
    /// that exists but fails to decode is a [`StoreError::Corrupt`].
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.records.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.records.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes the full mapping back to disk. The document is written to a
    /// sibling temp file first and renamed over the store, so a crash
    /// mid-write leaves the previous version intact.
    pub async fn save(&self) -> Result<(), StoreError> {
        use tokio::io::AsyncWriteExt;

        let json =
            serde_json::to_vec_pretty(&self.records).map_err(|source| StoreError::Encode {
                path: self.path.clone(),
                source,
            })?;

        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await.map_err(io_err)?;
        file.write_all(&json).await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static UNIQUE: AtomicUsize = AtomicUsize::new(0);

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "legion-bot-{}-{}-{}.json",
            name,
            std::process::id(),
            UNIQUE.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let path = temp_store_path("roundtrip");

        let mut store: RecordStore<u32> = RecordStore::load(&path).unwrap();
        store.insert("100", 1);
        store.insert("200", 3);
        store.save().await.unwrap();

        let reloaded: RecordStore<u32> = RecordStore::load(&path).unwrap();
        assert_eq!(reloaded.get("100"), Some(&1));
        assert_eq!(reloaded.get("200"), Some(&3));
        assert_eq!(reloaded.len(), 2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_loads_empty() {
        let path = temp_store_path("missing");
        let store: RecordStore<u32> = RecordStore::load(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_is_corrupt() {
        let path = temp_store_path("corrupt");
        std::fs::write(&path, b"{ not json").unwrap();

        let result: Result<RecordStore<u32>, _> = RecordStore::load(&path);
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn overwrites_previous_content() {
        let path = temp_store_path("overwrite");

        let mut store: RecordStore<OnboardingRecord> = RecordStore::load(&path).unwrap();
        store.insert(
            "100",
            OnboardingRecord {
                completed: false,
                timestamp: String::new(),
            },
        );
        store.save().await.unwrap();

        store.insert(
            "100",
            OnboardingRecord {
                completed: true,
                timestamp: "2024-01-01T00:00:00Z".to_string(),
            },
        );
        store.save().await.unwrap();

        let reloaded: RecordStore<OnboardingRecord> = RecordStore::load(&path).unwrap();
        assert!(reloaded.get("100").unwrap().completed);

        let _ = std::fs::remove_file(&path);
    }
}
