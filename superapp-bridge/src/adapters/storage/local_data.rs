use super::json_file::JsonFileMap;
use crate::ports::bridge::LocalDataStore;
use crate::ports::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

fn scoped_key(namespace: &str, key: &str) -> String {
    format!("{namespace}/{key}")
}

#[derive(Default)]
pub struct InMemoryLocalDataStore {
    inner: RwLock<HashMap<String, String>>,
}

impl InMemoryLocalDataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalDataStore for InMemoryLocalDataStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .get(&scoped_key(namespace, key))
            .cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .insert(scoped_key(namespace, key), value);
        Ok(())
    }
}

pub struct FileLocalDataStore {
    entries: JsonFileMap<String>,
}

impl FileLocalDataStore {
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        Ok(Self {
            entries: JsonFileMap::open(path)?,
        })
    }
}

#[async_trait]
impl LocalDataStore for FileLocalDataStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(&scoped_key(namespace, key)).await)
    }

    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(scoped_key(namespace, key), value).await
    }
}
