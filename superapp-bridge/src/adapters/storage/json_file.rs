use crate::ports::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

const TMP_SUFFIX: &str = ".tmp";

/// String-keyed JSON map persisted with temp-file + rename writes.
pub struct JsonFileMap<V> {
    path: PathBuf,
    inner: RwLock<BTreeMap<String, V>>,
}

impl<V> JsonFileMap<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = if path.exists() {
            let data = std::fs::read(&path)
                .map_err(|err| StoreError::Io(format!("reading {}: {err}", path.display())))?;
            if data.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&data).map_err(|err| {
                    StoreError::Corrupted(format!("parsing {}: {err}", path.display()))
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            inner: RwLock::new(entries),
        })
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: String, value: V) -> Result<(), StoreError> {
        let mut entries = self.inner.write().await;
        entries.insert(key, value);
        self.persist(&entries).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.inner.write().await;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries).await
    }

    // Called with the write guard held so concurrent writers land in order.
    async fn persist(&self, entries: &BTreeMap<String, V>) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|err| StoreError::Io(format!("encoding {}: {err}", self.path.display())))?;
        let tmp_path = self.path.with_extension(format!(
            "{}{}",
            self.path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("json"),
            TMP_SUFFIX
        ));
        let io_err = |what: &str, err: std::io::Error| {
            StoreError::Io(format!("{what} {}: {err}", tmp_path.display()))
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| io_err("creating parent of", err))?;
        }
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|err| io_err("creating", err))?;
        file.write_all(&json)
            .await
            .map_err(|err| io_err("writing", err))?;
        file.flush().await.map_err(|err| io_err("flushing", err))?;
        drop(file);
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|err| io_err("renaming", err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn persists_and_reloads_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("store.json");
        let map: JsonFileMap<String> = JsonFileMap::open(path.clone()).unwrap();
        map.insert("a".into(), "1".into()).await.unwrap();
        map.insert("b".into(), "2".into()).await.unwrap();
        map.remove("a").await.unwrap();

        let reloaded: JsonFileMap<String> = JsonFileMap::open(path).unwrap();
        assert!(reloaded.get("a").await.is_none());
        assert_eq!(reloaded.get("b").await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn corrupted_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        std::fs::write(&path, b"not-json").unwrap();
        let result: Result<JsonFileMap<String>, _> = JsonFileMap::open(path);
        assert!(matches!(result, Err(StoreError::Corrupted(_))));
    }

    #[tokio::test]
    async fn concurrent_inserts_are_all_kept() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        let map: Arc<JsonFileMap<u32>> = Arc::new(JsonFileMap::open(path.clone()).unwrap());
        let handles: Vec<_> = (0..8u32)
            .map(|n| {
                let map = map.clone();
                tokio::spawn(async move { map.insert(format!("k{n}"), n).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        let reloaded: JsonFileMap<u32> = JsonFileMap::open(path).unwrap();
        for n in 0..8u32 {
            assert_eq!(reloaded.get(&format!("k{n}")).await, Some(n));
        }
    }
}
