use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Correlation id carried by every bridge frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err("request id cannot be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        RequestId::new(value).map_err(D::Error::custom)
    }
}

/// Capabilities every host ships with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoreTopic {
    Token,
    UserId,
    QrRequest,
    QrClose,
    Alert,
    ConfirmAlert,
    SaveLocalData,
    GetLocalData,
    MicroAppToken,
    SecurityAudit,
}

impl CoreTopic {
    pub const ALL: [CoreTopic; 10] = [
        CoreTopic::Token,
        CoreTopic::UserId,
        CoreTopic::QrRequest,
        CoreTopic::QrClose,
        CoreTopic::Alert,
        CoreTopic::ConfirmAlert,
        CoreTopic::SaveLocalData,
        CoreTopic::GetLocalData,
        CoreTopic::MicroAppToken,
        CoreTopic::SecurityAudit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CoreTopic::Token => "token",
            CoreTopic::UserId => "user_id",
            CoreTopic::QrRequest => "qr_request",
            CoreTopic::QrClose => "qr_close",
            CoreTopic::Alert => "alert",
            CoreTopic::ConfirmAlert => "confirm_alert",
            CoreTopic::SaveLocalData => "save_local_data",
            CoreTopic::GetLocalData => "get_local_data",
            CoreTopic::MicroAppToken => "micro_app_token",
            CoreTopic::SecurityAudit => "security_audit",
        }
    }
}

/// Topic of a bridge request: a known core capability or a feature-registered one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Core(CoreTopic),
    Custom(String),
}

impl Topic {
    pub fn name(&self) -> &str {
        match self {
            Topic::Core(core) => core.name(),
            Topic::Custom(name) => name.as_str(),
        }
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Err("topic cannot be empty".to_string());
        }
        let core = CoreTopic::ALL
            .iter()
            .find(|core| core.name() == value)
            .copied();
        Ok(match core {
            Some(core) => Topic::Core(core),
            None => Topic::Custom(value.to_string()),
        })
    }
}

impl From<CoreTopic> for Topic {
    fn from(value: CoreTopic) -> Self {
        Topic::Core(value)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Topic {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_topics_parse_to_core_variants() {
        assert_eq!(Topic::Core(CoreTopic::QrRequest), "qr_request".parse().unwrap());
        assert_eq!(Topic::Core(CoreTopic::Token), "token".parse().unwrap());
        let custom: Topic = "payslip.download".parse().unwrap();
        assert_eq!(custom, Topic::Custom("payslip.download".into()));
        assert!("  ".parse::<Topic>().is_err());
    }

    #[test]
    fn core_topic_names_round_trip() {
        for core in CoreTopic::ALL {
            assert_eq!(Topic::Core(core), core.name().parse().unwrap());
        }
    }

    #[test]
    fn request_id_validation() {
        assert!(RequestId::new("123").is_ok());
        assert!(RequestId::new("").is_err());
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
