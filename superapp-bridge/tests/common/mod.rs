#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use superapp_bridge::adapters::auth::InMemoryTokenStore;
use superapp_bridge::adapters::bridge::ChannelRenderer;
use superapp_bridge::adapters::storage::InMemoryLocalDataStore;
use superapp_bridge::app::auth::TokenLifecycleManager;
use superapp_bridge::app::bridge::{
    BridgeDeps, BridgeOptions, CapabilityRegistry, MicroAppSessionController, SessionParams,
};
use superapp_bridge::domain::credential::SessionCredential;
use superapp_bridge::ports::auth::{
    ApiRequest, ApiResponse, Clock, HttpTransport, IdentityError, IdentityProvider,
    LogoutHandler, TokenExchangeRequest, TransportError,
};
use superapp_bridge::ports::bridge::{
    AlertRequest, ConfirmChoice, ConfirmRequest, DeviceError, DevicePort,
};
use tokio::sync::{mpsc, Notify};

pub const SHELL_EXP: i64 = 2_000_000_000;

pub fn jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"emp-1","exp":{exp}}}"#));
    format!("{header}.{payload}.sig")
}

pub struct FixedClock(pub DateTime<Utc>);

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

/// Refreshes hand out `refreshed`; exchanges hand out `"{app}:{client}"`.
pub struct FakeIdentity {
    refreshed: String,
    refreshes: AtomicUsize,
    fail_exchange: AtomicBool,
    exchanges: Mutex<Vec<TokenExchangeRequest>>,
}

impl FakeIdentity {
    pub fn new(refreshed: impl Into<String>) -> Self {
        Self {
            refreshed: refreshed.into(),
            refreshes: AtomicUsize::new(0),
            fail_exchange: AtomicBool::new(false),
            exchanges: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_exchange() -> Self {
        let identity = Self::new(jwt(SHELL_EXP + 3600));
        identity.fail_exchange.store(true, Ordering::SeqCst);
        identity
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn exchanges(&self) -> Vec<TokenExchangeRequest> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn refresh(&self, _refresh_token: &str) -> Result<SessionCredential, IdentityError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(SessionCredential::new(self.refreshed.clone()))
    }

    async fn exchange_token(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<SessionCredential, IdentityError> {
        self.exchanges.lock().unwrap().push(request.clone());
        if self.fail_exchange.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected {
                status: 400,
                message: "invalid_target".into(),
            });
        }
        Ok(SessionCredential::new(format!(
            "{}:{}",
            request.app_id, request.client_id
        )))
    }
}

#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn respond(&self, status: u16, body: Value) {
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
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Failed("unexpected request".into()))
    }
}

/// Scanner resolves once a code is pushed; confirmations always confirm.
#[derive(Default)]
pub struct FakeDevice {
    codes: tokio::sync::Mutex<VecDeque<String>>,
    code_ready: Notify,
    scan_started: Notify,
    prompts: Mutex<Vec<Option<String>>>,
    alerts: Mutex<Vec<AlertRequest>>,
}

impl FakeDevice {
    pub async fn push_code(&self, code: &str) {
        self.codes.lock().await.push_back(code.to_string());
        self.code_ready.notify_one();
    }

    pub async fn wait_for_scan(&self) {
        self.scan_started.notified().await;
    }

    pub fn prompts(&self) -> Vec<Option<String>> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<AlertRequest> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DevicePort for FakeDevice {
    async fn alert(&self, request: AlertRequest) -> Result<(), DeviceError> {
        self.alerts.lock().unwrap().push(request);
        Ok(())
    }

    async fn confirm(&self, _request: ConfirmRequest) -> Result<ConfirmChoice, DeviceError> {
        Ok(ConfirmChoice::Confirm)
    }

    async fn scan_code(&self, prompt: Option<&str>) -> Result<String, DeviceError> {
        self.prompts.lock().unwrap().push(prompt.map(str::to_string));
        self.scan_started.notify_one();
        loop {
            if let Some(code) = self.codes.lock().await.pop_front() {
                return Ok(code);
            }
            self.code_ready.notified().await;
        }
    }
}

pub struct Host {
    pub deps: BridgeDeps,
    pub store: Arc<InMemoryTokenStore>,
    pub identity: Arc<FakeIdentity>,
    pub transport: Arc<FakeTransport>,
    pub device: Arc<FakeDevice>,
    pub logout: Arc<RecordingLogout>,
}

impl Host {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self::with_identity(registry, FakeIdentity::new(jwt(SHELL_EXP + 3600)))
    }

    pub fn with_identity(registry: CapabilityRegistry, identity: FakeIdentity) -> Self {
        let store = Arc::new(InMemoryTokenStore::with_shell_credential(
            SessionCredential::new(jwt(SHELL_EXP)).with_refresh_token("refresh-1"),
        ));
        let identity = Arc::new(identity);
        let transport = Arc::new(FakeTransport::default());
        let device = Arc::new(FakeDevice::default());
        let logout = Arc::new(RecordingLogout::default());
        let auth = TokenLifecycleManager::new(
            store.clone(),
            identity.clone(),
            transport.clone(),
            Arc::new(FixedClock::at(SHELL_EXP - 60)),
            logout.clone(),
        );
        let deps = BridgeDeps {
            registry: Arc::new(registry),
            auth: Arc::new(auth),
            device: device.clone(),
            local_data: Arc::new(InMemoryLocalDataStore::new()),
            options: BridgeOptions {
                micro_app_root: std::env::temp_dir().join("micro-apps"),
                api_base: Some("https://api.example.com/v1".parse().unwrap()),
                reply_timeout: Duration::from_millis(500),
                ..BridgeOptions::default()
            },
        };
        Self {
            deps,
            store,
            identity,
            transport,
            device,
            logout,
        }
    }

    pub fn open(&self, params: SessionParams) -> Session {
        let (renderer, outbound) = ChannelRenderer::pair();
        let controller =
            MicroAppSessionController::new(params, Arc::new(renderer), self.deps.clone()).unwrap();
        Session {
            controller,
            outbound,
        }
    }
}

pub fn params(app_id: &str, client_id: &str) -> SessionParams {
    SessionParams {
        app_id: app_id.into(),
        app_name: "Sample".into(),
        client_id: client_id.into(),
        web_view_uri: "https://apps.example.com/sample/".into(),
        exchanged_token: None,
        user_id: Some("emp-1".into()),
    }
}

pub struct Session {
    pub controller: MicroAppSessionController,
    pub outbound: mpsc::UnboundedReceiver<String>,
}

impl Session {
    pub async fn send(&self, frame: Value) {
        self.controller.on_message(&frame.to_string(), None).await;
    }

    pub async fn next_frame(&mut self) -> Value {
        let raw = tokio::time::timeout(Duration::from_secs(2), self.outbound.recv())
            .await
            .expect("frame within timeout")
            .expect("renderer channel open");
        serde_json::from_str(&raw).unwrap()
    }

    pub fn no_frame(&mut self) -> bool {
        self.outbound.try_recv().is_err()
    }
}
