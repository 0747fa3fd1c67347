//! Port fakes shared by unit tests.

use crate::domain::credential::SessionCredential;
use crate::ports::auth::{
    ApiRequest, ApiResponse, Clock, HttpTransport, IdentityError, IdentityProvider,
    LogoutHandler, TokenExchangeRequest, TransportError,
};
use crate::ports::bridge::{AlertRequest, ConfirmChoice, ConfirmRequest, DeviceError, DevicePort};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn at(timestamp: i64) -> Self {
        Self(DateTime::from_timestamp(timestamp, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
pub struct RecordingLogout {
    calls: AtomicUsize,
}

impl RecordingLogout {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogoutHandler for RecordingLogout {
    async fn logout(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Identity provider that issues `issued` for every grant.
pub struct ScriptedIdentity {
    issued: String,
    refresh_calls: AtomicUsize,
    refresh_fails: AtomicBool,
    exchange_fails: AtomicBool,
    exchange_gate: Mutex<Option<std::sync::Arc<Notify>>>,
    exchanges: Mutex<Vec<TokenExchangeRequest>>,
}

impl ScriptedIdentity {
    pub fn new(issued: impl Into<String>) -> Self {
        Self {
            issued: issued.into(),
            refresh_calls: AtomicUsize::new(0),
            refresh_fails: AtomicBool::new(false),
            exchange_fails: AtomicBool::new(false),
            exchange_gate: Mutex::new(None),
            exchanges: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_refresh(&self) {
        self.refresh_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_exchange(&self) {
        self.exchange_fails.store(true, Ordering::SeqCst);
    }

    /// Holds exchanges until the returned notify fires.
    pub fn gate_exchange(&self) -> std::sync::Arc<Notify> {
        let gate = std::sync::Arc::new(Notify::new());
        *self.exchange_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn exchanges(&self) -> Vec<TokenExchangeRequest> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn refresh(&self, _refresh_token: &str) -> Result<SessionCredential, IdentityError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected {
                status: 400,
                message: "invalid_grant".into(),
            });
        }
        Ok(SessionCredential::new(self.issued.clone()))
    }

    async fn exchange_token(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<SessionCredential, IdentityError> {
        self.exchanges.lock().unwrap().push(request.clone());
        let gate = self.exchange_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.exchange_fails.load(Ordering::SeqCst) {
            return Err(IdentityError::Transport("connection refused".into()));
        }
        Ok(SessionCredential::new(format!(
            "{}-{}",
            request.app_id, request.client_id
        )))
    }
}

/// Transport replaying queued responses and recording every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(ApiResponse::new(status, body));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Failed("no scripted response".into()))
    }
}

/// Device whose scanner blocks until a code is pushed.
#[derive(Default)]
pub struct ScriptedDevice {
    codes: tokio::sync::Mutex<VecDeque<String>>,
    code_ready: Notify,
    prompts: Mutex<Vec<Option<String>>>,
    alerts: Mutex<Vec<AlertRequest>>,
}

impl ScriptedDevice {
    pub async fn push_code(&self, code: impl Into<String>) {
        self.codes.lock().await.push_back(code.into());
        self.code_ready.notify_one();
    }

    pub fn prompts(&self) -> Vec<Option<String>> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<AlertRequest> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DevicePort for ScriptedDevice {
    async fn alert(&self, request: AlertRequest) -> Result<(), DeviceError> {
        self.alerts.lock().unwrap().push(request);
        Ok(())
    }

    async fn confirm(&self, request: ConfirmRequest) -> Result<ConfirmChoice, DeviceError> {
        if request.title.contains("cancel") {
            Ok(ConfirmChoice::Cancel)
        } else {
            Ok(ConfirmChoice::Confirm)
        }
    }

    async fn scan_code(&self, prompt: Option<&str>) -> Result<String, DeviceError> {
        self.prompts.lock().unwrap().push(prompt.map(str::to_string));
        loop {
            if let Some(code) = self.codes.lock().await.pop_front() {
                return Ok(code);
            }
            self.code_ready.notified().await;
        }
    }
}
