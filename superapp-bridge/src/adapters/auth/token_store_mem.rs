use crate::domain::credential::{CredentialSlot, SessionCredential};
use crate::ports::auth::TokenStore;
use crate::ports::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryTokenStore {
    inner: RwLock<HashMap<CredentialSlot, SessionCredential>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell_credential(credential: SessionCredential) -> Self {
        let mut entries = HashMap::new();
        entries.insert(CredentialSlot::Shell, credential);
        Self {
            inner: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self, slot: &CredentialSlot) -> Result<Option<SessionCredential>, StoreError> {
        Ok(self.inner.read().await.get(slot).cloned())
    }

    async fn save(
        &self,
        slot: &CredentialSlot,
        credential: SessionCredential,
    ) -> Result<(), StoreError> {
        self.inner.write().await.insert(slot.clone(), credential);
        Ok(())
    }

    async fn clear(&self, slot: &CredentialSlot) -> Result<(), StoreError> {
        self.inner.write().await.remove(slot);
        Ok(())
    }
}
