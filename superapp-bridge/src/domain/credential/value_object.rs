use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access/refresh pair held for the shell or for one micro-app.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Decoded `exp` claim, kept for display. Expiry checks decode the
    /// token again and never read this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionCredential {
    pub fn new(access_token: impl Into<String>) -> Self {
        let access_token = access_token.into();
        let expires_at = decode_expiry(&access_token);
        Self {
            access_token,
            refresh_token: None,
            expires_at,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Expiry is read from the token's own `exp` claim; a token that cannot be
    /// decoded counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match decode_expiry(&self.access_token) {
            Some(exp) => exp < now,
            None => true,
        }
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Reads the `exp` claim of a JWT without verifying its signature.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claim.exp, 0)
}

/// Token Store slot. Micro-app slots are keyed by app and client so one
/// session's exchange never overwrites another's credential.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CredentialSlot {
    Shell,
    MicroApp { app_id: String, client_id: String },
}

impl CredentialSlot {
    pub fn micro_app(app_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        CredentialSlot::MicroApp {
            app_id: app_id.into(),
            client_id: client_id.into(),
        }
    }

    pub fn key(&self) -> String {
        match self {
            CredentialSlot::Shell => "shell".to_string(),
            CredentialSlot::MicroApp { app_id, client_id } => {
                format!("microapp:{app_id}:{client_id}")
            }
        }
    }
}

impl fmt::Display for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
pub(crate) fn unsigned_jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user","exp":{exp}}}"#));
    format!("{header}.{payload}.sig")
}
