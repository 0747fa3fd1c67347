use super::retry::AuthRetry;
use crate::domain::credential::{CredentialSlot, SessionCredential};
use crate::ports::auth::{
    ApiRequest, ApiResponse, Clock, HttpTransport, IdentityError, IdentityProvider,
    LogoutHandler, TokenExchangeRequest, TokenStore, TransportError,
};
use crate::ports::StoreError;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request still unauthorized after token refresh")]
    Rejected,
    #[error("request failed with status {status}")]
    Http { status: u16, body: Value },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("token store failure: {0}")]
    Store(#[from] StoreError),
    #[error("no subject token available for exchange")]
    MissingSubjectToken,
    #[error("token exchange failed: {0}")]
    Exchange(#[from] IdentityError),
}

/// Inputs of a per-app token exchange as seen by a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MicroAppTokenRequest {
    pub app_id: String,
    pub client_id: String,
    /// Token handed over by the shell when it opened the session.
    pub exchanged_token: Option<String>,
    pub scope: Option<String>,
}

/// Keeps the shell credential fresh and issues per-app credentials.
pub struct TokenLifecycleManager {
    store: Arc<dyn TokenStore>,
    identity: Arc<dyn IdentityProvider>,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    logout: Arc<dyn LogoutHandler>,
}

impl TokenLifecycleManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        identity: Arc<dyn IdentityProvider>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        logout: Arc<dyn LogoutHandler>,
    ) -> Self {
        Self {
            store,
            identity,
            transport,
            clock,
            logout,
        }
    }

    /// Logout collaborator used when no caller-specific one is supplied.
    pub fn default_logout(&self) -> Arc<dyn LogoutHandler> {
        self.logout.clone()
    }

    pub async fn credential(
        &self,
        slot: &CredentialSlot,
    ) -> Result<Option<SessionCredential>, AuthError> {
        Ok(self.store.load(slot).await?)
    }

    /// Shell credential valid at the clock's current instant, refreshed when
    /// needed. `None` means the user is signed out.
    pub async fn fresh_shell_credential(
        &self,
        on_unauthenticated: &dyn LogoutHandler,
    ) -> Result<Option<SessionCredential>, AuthError> {
        let Some(credential) = self.store.load(&CredentialSlot::Shell).await? else {
            debug!(event = "auth.no_credential", "no shell credential stored");
            return Ok(None);
        };
        if !credential.is_expired_at(self.clock.now()) {
            return Ok(Some(credential));
        }
        debug!(event = "auth.expired", "shell access token expired");
        self.refresh_shell(credential, on_unauthenticated).await
    }

    /// Performs `request` with the shell credential attached, refreshing
    /// before the call when expired and retrying once after a 401.
    pub async fn authorized_call(
        &self,
        request: ApiRequest,
        on_unauthenticated: &dyn LogoutHandler,
    ) -> Result<Option<ApiResponse>, AuthError> {
        let Some(mut credential) = self.fresh_shell_credential(on_unauthenticated).await? else {
            return Ok(None);
        };

        let mut state = AuthRetry::Fresh;
        while state.may_send() {
            let response = self
                .transport
                .send(request.clone().authorized(&credential.access_token))
                .await?;
            if !response.is_unauthorized() {
                return classify(response).map(Some);
            }

            state = state.on_unauthorized();
            if state == AuthRetry::Failed {
                break;
            }
            info!(event = "auth.unauthorized", url = %request.url, "refreshing after 401");
            match self.refresh_shell(credential, on_unauthenticated).await? {
                Some(fresh) => credential = fresh,
                None => return Ok(None),
            }
            state = state.on_refreshed();
        }

        warn!(event = "auth.rejected", url = %request.url, "request unauthorized after refresh");
        Err(AuthError::Rejected)
    }

    /// Exchanges a subject token for a credential scoped to one micro-app
    /// client and stores it in that app's slot.
    pub async fn exchange_micro_app_token(
        &self,
        request: MicroAppTokenRequest,
    ) -> Result<SessionCredential, AuthError> {
        let subject_token = match request.exchanged_token.filter(|token| !token.is_empty()) {
            Some(token) => token,
            None => self
                .fresh_shell_credential(self.logout.as_ref())
                .await?
                .map(|credential| credential.access_token)
                .ok_or(AuthError::MissingSubjectToken)?,
        };

        let exchange = TokenExchangeRequest {
            app_id: request.app_id.clone(),
            client_id: request.client_id.clone(),
            subject_token,
            scope: request.scope,
        };
        let credential = self.identity.exchange_token(&exchange).await?;
        let slot = CredentialSlot::micro_app(request.app_id, request.client_id);
        self.store.save(&slot, credential.clone()).await?;
        info!(event = "auth.exchanged", %slot, "micro-app credential issued");
        Ok(credential)
    }

    async fn refresh_shell(
        &self,
        current: SessionCredential,
        on_unauthenticated: &dyn LogoutHandler,
    ) -> Result<Option<SessionCredential>, AuthError> {
        let Some(refresh_token) = current.refresh_token else {
            warn!(event = "auth.refresh_failed", "no refresh token held; logging out");
            on_unauthenticated.logout().await;
            return Ok(None);
        };

        match self.identity.refresh(&refresh_token).await {
            Ok(mut fresh) => {
                if fresh.refresh_token.is_none() {
                    fresh.refresh_token = Some(refresh_token);
                }
                self.store
                    .save(&CredentialSlot::Shell, fresh.clone())
                    .await?;
                info!(event = "auth.refreshed", "shell credential refreshed");
                Ok(Some(fresh))
            }
            Err(err) => {
                warn!(%err, event = "auth.refresh_failed", "refresh rejected; logging out");
                on_unauthenticated.logout().await;
                Ok(None)
            }
        }
    }
}

fn classify(response: ApiResponse) -> Result<ApiResponse, AuthError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(AuthError::Http {
            status: response.status,
            body: response.body,
        })
    }
}
