use crate::ports::StoreError;
use async_trait::async_trait;

/// Device-local key-value storage. Keys are namespaced per micro-app.
#[async_trait]
pub trait LocalDataStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), StoreError>;
}
