use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Strongly typed identifier for a micro-app session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|err| format!("invalid session id: {err}"))
    }
}

impl Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}

/// The `(appId, appName, clientId)` tuple a session is opened for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroAppIdentity {
    pub app_id: String,
    pub app_name: String,
    pub client_id: String,
}

impl MicroAppIdentity {
    pub fn new(
        app_id: impl Into<String>,
        app_name: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Result<Self, String> {
        let app_id = app_id.into();
        let client_id = client_id.into();
        if app_id.trim().is_empty() {
            return Err("app id cannot be empty".to_string());
        }
        if client_id.trim().is_empty() {
            return Err("client id cannot be empty".to_string());
        }
        Ok(Self {
            app_id,
            app_name: app_name.into(),
            client_id,
        })
    }

    /// TOTP authenticator apps get the second-factor scanner prompt.
    pub fn is_totp(&self) -> bool {
        self.app_id.to_ascii_lowercase().contains("totp")
    }
}
