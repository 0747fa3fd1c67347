use crate::adapters::storage::JsonFileMap;
use crate::domain::credential::{CredentialSlot, SessionCredential};
use crate::ports::auth::TokenStore;
use crate::ports::StoreError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Token Store backed by a JSON file in the daemon's state directory.
pub struct FileTokenStore {
    entries: JsonFileMap<SessionCredential>,
}

impl FileTokenStore {
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        Ok(Self {
            entries: JsonFileMap::open(path)?,
        })
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self, slot: &CredentialSlot) -> Result<Option<SessionCredential>, StoreError> {
        Ok(self.entries.get(&slot.key()).await)
    }

    async fn save(
        &self,
        slot: &CredentialSlot,
        credential: SessionCredential,
    ) -> Result<(), StoreError> {
        self.entries.insert(slot.key(), credential).await
    }

    async fn clear(&self, slot: &CredentialSlot) -> Result<(), StoreError> {
        self.entries.remove(&slot.key()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credential::unsigned_jwt;
    use tempfile::TempDir;

    #[tokio::test]
    async fn credentials_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tokens.json");
        let store = FileTokenStore::open(path.clone()).unwrap();
        let credential =
            SessionCredential::new(unsigned_jwt(4_000_000_000)).with_refresh_token("refresh");
        store
            .save(&CredentialSlot::Shell, credential.clone())
            .await
            .unwrap();

        let reopened = FileTokenStore::open(path).unwrap();
        assert_eq!(
            reopened.load(&CredentialSlot::Shell).await.unwrap(),
            Some(credential)
        );
        reopened.clear(&CredentialSlot::Shell).await.unwrap();
        assert!(reopened
            .load(&CredentialSlot::Shell)
            .await
            .unwrap()
            .is_none());
    }
}
