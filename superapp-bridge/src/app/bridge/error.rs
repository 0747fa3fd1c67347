use crate::app::auth::AuthError;
use crate::ports::bridge::DeviceError;
use crate::ports::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Failure of a shell-initiated request to the mini-app.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("request cancelled: session torn down")]
    Cancelled,
    #[error("no reply from mini-app within {0:?}")]
    Timeout(Duration),
    #[error("mini-app replied with error: {0}")]
    Remote(String),
    #[error("renderer unavailable: {0}")]
    Renderer(String),
    #[error("request id already pending: {0}")]
    DuplicateRequest(String),
    #[error("session closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("{0}")]
    Failed(String),
    #[error("not authenticated: {0}")]
    Unauthenticated(String),
    #[error("session state: {0}")]
    Session(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<serde_json::Error> for HandlerError {
    fn from(value: serde_json::Error) -> Self {
        HandlerError::InvalidPayload(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session parameters: {0}")]
    InvalidParams(String),
    #[error("invalid transition: {0}")]
    Transition(String),
    #[error("token exchange failed: {0}")]
    Exchange(#[from] AuthError),
    #[error("micro-app is not available: {0}")]
    LoadUri(String),
    #[error("session closed")]
    Closed,
}
