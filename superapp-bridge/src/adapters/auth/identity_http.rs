use super::http_reqwest::decode_body;
use crate::domain::credential::SessionCredential;
use crate::ports::auth::{IdentityError, IdentityProvider, TokenExchangeRequest};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const REFRESH_TOKEN_GRANT: &str = "refresh_token";
pub const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
pub const JWT_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:jwt";
pub const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";

/// Form body of a token endpoint call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenGrant {
    Refresh {
        refresh_token: String,
    },
    Exchange {
        subject_token: String,
        scope: Option<String>,
    },
}

impl TokenGrant {
    pub fn form_fields(&self, client_id: &str) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        match self {
            TokenGrant::Refresh { refresh_token } => {
                fields.push(("grant_type", REFRESH_TOKEN_GRANT.to_string()));
                fields.push(("refresh_token", refresh_token.clone()));
                fields.push(("client_id", client_id.to_string()));
            }
            TokenGrant::Exchange {
                subject_token,
                scope,
            } => {
                fields.push(("grant_type", TOKEN_EXCHANGE_GRANT.to_string()));
                fields.push(("subject_token", subject_token.clone()));
                fields.push(("subject_token_type", JWT_TOKEN_TYPE.to_string()));
                fields.push(("requested_token_type", ACCESS_TOKEN_TYPE.to_string()));
                fields.push(("client_id", client_id.to_string()));
                if let Some(scope) = scope {
                    fields.push(("scope", scope.clone()));
                }
            }
        }
        fields
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    /// `expires_in` is ignored: expiry always comes from the token's own
    /// `exp` claim.
    fn into_credential(self) -> SessionCredential {
        let credential = SessionCredential::new(self.access_token);
        match self.refresh_token {
            Some(refresh_token) => credential.with_refresh_token(refresh_token),
            None => credential,
        }
    }
}

fn error_message(body: &Value) -> String {
    body.get("error_description")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

/// OAuth token endpoint client. The shell's own client id is used for
/// refreshes; exchanges use the micro-app's client id.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    token_endpoint: Url,
    shell_client_id: String,
    timeout: Duration,
}

impl HttpIdentityProvider {
    pub fn new(token_endpoint: Url, shell_client_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_endpoint,
            shell_client_id: shell_client_id.into(),
            timeout,
        }
    }

    async fn request_token(
        &self,
        grant: TokenGrant,
        client_id: &str,
    ) -> Result<SessionCredential, IdentityError> {
        let fields = grant.form_fields(client_id);
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter().map(|(name, value)| (*name, value.as_str())))
            .finish();
        let response = self
            .client
            .post(self.token_endpoint.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|err| IdentityError::Transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| IdentityError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message: error_message(&decode_body(&bytes)),
            });
        }
        let parsed: TokenResponse = serde_json::from_slice(&bytes)
            .map_err(|err| IdentityError::InvalidResponse(err.to_string()))?;
        Ok(parsed.into_credential())
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn refresh(&self, refresh_token: &str) -> Result<SessionCredential, IdentityError> {
        let grant = TokenGrant::Refresh {
            refresh_token: refresh_token.to_string(),
        };
        self.request_token(grant, &self.shell_client_id).await
    }

    async fn exchange_token(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<SessionCredential, IdentityError> {
        let grant = TokenGrant::Exchange {
            subject_token: request.subject_token.clone(),
            scope: request.scope.clone(),
        };
        self.request_token(grant, &request.client_id).await
    }
}
