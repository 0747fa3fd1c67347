use crate::domain::credential::CredentialSlot;
use crate::ports::auth::{Clock, LogoutHandler, TokenStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Logout that forgets the shell credential; the user has to sign in again.
pub struct ClearShellCredentials {
    store: Arc<dyn TokenStore>,
}

impl ClearShellCredentials {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LogoutHandler for ClearShellCredentials {
    async fn logout(&self) {
        match self.store.clear(&CredentialSlot::Shell).await {
            Ok(()) => info!(event = "auth.logout", "shell credential cleared"),
            Err(err) => warn!(%err, event = "auth.logout", "failed to clear shell credential"),
        }
    }
}
