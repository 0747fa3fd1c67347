use crate::domain::credential::{CredentialSlot, SessionCredential};
use crate::ports::StoreError;
use async_trait::async_trait;

/// Secure storage for the shell credential and every micro-app's credential.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self, slot: &CredentialSlot) -> Result<Option<SessionCredential>, StoreError>;
    async fn save(
        &self,
        slot: &CredentialSlot,
        credential: SessionCredential,
    ) -> Result<(), StoreError>;
    async fn clear(&self, slot: &CredentialSlot) -> Result<(), StoreError>;
}
