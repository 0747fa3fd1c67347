use crate::domain::credential::SessionCredential;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider rejected the grant ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("identity provider unreachable: {0}")]
    Transport(String),
    #[error("invalid identity provider response: {0}")]
    InvalidResponse(String),
}

/// Parameters of a per-app token exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenExchangeRequest {
    pub app_id: String,
    pub client_id: String,
    pub subject_token: String,
    pub scope: Option<String>,
}

/// Identity provider grants used after the initial sign-in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `refresh_token` grant for the shell session.
    async fn refresh(&self, refresh_token: &str) -> Result<SessionCredential, IdentityError>;

    /// Token-exchange grant issuing a credential scoped to one micro-app client.
    async fn exchange_token(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<SessionCredential, IdentityError>;
}
