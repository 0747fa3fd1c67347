use crate::ports::bridge::{
    AlertRequest, ConfirmChoice, ConfirmRequest, DeviceError, DevicePort,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::info;

/// Device without a screen or camera. Alerts are logged, confirmations
/// resolve to a fixed choice and scans replay queued codes.
pub struct HeadlessDevice {
    confirm_default: ConfirmChoice,
    scan_codes: Mutex<VecDeque<String>>,
}

impl HeadlessDevice {
    pub fn new(confirm_default: ConfirmChoice) -> Self {
        Self {
            confirm_default,
            scan_codes: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_scan_codes(self, codes: impl IntoIterator<Item = String>) -> Self {
        if let Ok(mut queue) = self.scan_codes.lock() {
            queue.extend(codes);
        }
        self
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(ConfirmChoice::Cancel)
    }
}

#[async_trait]
impl DevicePort for HeadlessDevice {
    async fn alert(&self, request: AlertRequest) -> Result<(), DeviceError> {
        info!(
            event = "device.alert",
            title = %request.title,
            message = %request.message,
            "alert shown"
        );
        Ok(())
    }

    async fn confirm(&self, request: ConfirmRequest) -> Result<ConfirmChoice, DeviceError> {
        info!(
            event = "device.confirm",
            title = %request.title,
            choice = ?self.confirm_default,
            "confirmation answered"
        );
        Ok(self.confirm_default)
    }

    async fn scan_code(&self, prompt: Option<&str>) -> Result<String, DeviceError> {
        let next = self
            .scan_codes
            .lock()
            .map_err(|_| DeviceError::Failed("scan queue poisoned".into()))?
            .pop_front();
        match next {
            Some(code) => {
                info!(event = "device.scan", prompt = prompt.unwrap_or_default(), "code scanned");
                Ok(code)
            }
            None => Err(DeviceError::Unavailable("no camera attached".into())),
        }
    }
}
