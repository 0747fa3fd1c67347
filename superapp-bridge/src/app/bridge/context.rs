use super::error::HandlerError;
use super::security::SecurityPolicy;
use super::session::{BridgeOptions, SessionCore, TokenState};
use crate::app::auth::TokenLifecycleManager;
use crate::domain::bridge::{RequestId, Topic};
use crate::domain::session::{SessionId, SessionSnapshot};
use crate::ports::bridge::{DevicePort, LocalDataStore};
use std::sync::Arc;

/// Everything a capability handler may touch while serving one request.
#[derive(Clone)]
pub struct HandlerContext {
    core: Arc<SessionCore>,
    topic: Topic,
    request_id: Option<RequestId>,
}

impl HandlerContext {
    pub(crate) fn new(core: Arc<SessionCore>, topic: Topic, request_id: Option<RequestId>) -> Self {
        Self {
            core,
            topic,
            request_id,
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// `None` for notifications.
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn session_id(&self) -> SessionId {
        self.core.id()
    }

    pub fn app_id(&self) -> &str {
        &self.core.params.app_id
    }

    pub fn client_id(&self) -> &str {
        &self.core.params.client_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.core
            .params
            .user_id
            .as_deref()
            .filter(|user| !user.is_empty())
    }

    pub fn is_totp(&self) -> bool {
        self.core.is_totp()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.snapshot()
    }

    pub fn set_scanner_visible(&self, visible: bool) -> Result<(), HandlerError> {
        self.core
            .set_scanner_visible(visible)
            .map_err(HandlerError::Session)
    }

    /// The session's exchanged access token. Waits while the exchange is
    /// still running.
    pub async fn access_token(&self) -> Result<String, HandlerError> {
        let mut updates = self.core.token.subscribe();
        loop {
            let state = updates.borrow_and_update().clone();
            match state {
                TokenState::Ready(token) => return Ok(token),
                TokenState::Unavailable(reason) => {
                    return Err(HandlerError::Unauthenticated(reason))
                }
                TokenState::Pending => {}
            }
            if updates.changed().await.is_err() {
                return Err(HandlerError::Unauthenticated("session closed".to_string()));
            }
        }
    }

    pub fn device(&self) -> &dyn DevicePort {
        self.core.deps.device.as_ref()
    }

    pub fn local_data(&self) -> &dyn LocalDataStore {
        self.core.deps.local_data.as_ref()
    }

    pub fn auth(&self) -> &TokenLifecycleManager {
        &self.core.deps.auth
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.core.deps.options
    }

    pub fn security_policy(&self) -> Option<SecurityPolicy> {
        self.core.security_policy()
    }
}
