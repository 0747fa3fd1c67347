use super::value_object::{RequestId, Topic};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("frame must be a JSON object")]
    NotAnObject,
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
    #[error("invalid requestId: {0}")]
    InvalidRequestId(String),
    #[error("frame carries neither topic nor requestId")]
    Empty,
}

/// A frame posted by the mini-app. Requests carry a topic; replies to
/// shell-initiated requests carry only the correlation id and `data` or `error`.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundFrame {
    pub topic: Option<Topic>,
    pub data: Value,
    pub request_id: Option<RequestId>,
    pub error: Option<String>,
}

impl InboundFrame {
    pub fn parse(raw: &str) -> Result<Self, FrameError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| FrameError::InvalidJson(err.to_string()))?;
        let Value::Object(mut map) = value else {
            return Err(FrameError::NotAnObject);
        };

        let topic = match map.remove("topic") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.parse().map_err(FrameError::InvalidTopic)?),
            Some(other) => {
                return Err(FrameError::InvalidTopic(format!(
                    "expected string, got {other}"
                )))
            }
        };

        let request_id = match map.remove("requestId") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => {
                Some(RequestId::new(id).map_err(FrameError::InvalidRequestId)?)
            }
            Some(Value::Number(id)) => Some(
                RequestId::new(id.to_string()).map_err(FrameError::InvalidRequestId)?,
            ),
            Some(other) => {
                return Err(FrameError::InvalidRequestId(format!(
                    "expected string or number, got {other}"
                )))
            }
        };

        if topic.is_none() && request_id.is_none() {
            return Err(FrameError::Empty);
        }

        let error = match map.remove("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) => Some(message),
            Some(other) => Some(other.to_string()),
        };
        let data = map.remove("data").unwrap_or(Value::Null);

        Ok(Self {
            topic,
            data,
            request_id,
            error,
        })
    }

    /// Outcome of a reply frame: `error` wins over `data`.
    pub fn into_outcome(self) -> Result<Value, String> {
        match self.error {
            Some(message) => Err(message),
            None => Ok(self.data),
        }
    }
}

/// A frame posted into the mini-app's script context.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundFrame {
    pub request_id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutboundFrame {
    pub fn reply(request_id: RequestId, data: Value) -> Self {
        Self {
            request_id,
            topic: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(request_id: RequestId, message: impl Into<String>) -> Self {
        Self {
            request_id,
            topic: None,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn request(request_id: RequestId, topic: Topic, data: Value) -> Self {
        Self {
            request_id,
            topic: Some(topic),
            data: Some(data),
            error: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
