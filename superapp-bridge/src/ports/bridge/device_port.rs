use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device capability unavailable: {0}")]
    Unavailable(String),
    #[error("cancelled by user")]
    Cancelled,
    #[error("device capability failed: {0}")]
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRequest {
    pub title: String,
    pub message: String,
    #[serde(default = "default_button_text")]
    pub button_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    #[serde(default = "default_confirm_text")]
    pub confirm_button_text: String,
    #[serde(default = "default_cancel_text")]
    pub cancel_button_text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmChoice {
    Confirm,
    Cancel,
}

fn default_button_text() -> String {
    "OK".to_string()
}

fn default_confirm_text() -> String {
    "Confirm".to_string()
}

fn default_cancel_text() -> String {
    "Cancel".to_string()
}

/// Native device capabilities reachable from mini-apps.
#[async_trait]
pub trait DevicePort: Send + Sync {
    async fn alert(&self, request: AlertRequest) -> Result<(), DeviceError>;

    async fn confirm(&self, request: ConfirmRequest) -> Result<ConfirmChoice, DeviceError>;

    /// Opens the camera scanner and resolves with the decoded code.
    async fn scan_code(&self, prompt: Option<&str>) -> Result<String, DeviceError>;
}
