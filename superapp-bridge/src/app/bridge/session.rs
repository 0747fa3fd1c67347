use super::context::HandlerContext;
use super::error::{BridgeError, SessionError};
use super::ledger::PendingLedger;
use super::registry::CapabilityRegistry;
use super::security::SecurityPolicy;
use crate::app::auth::{MicroAppTokenRequest, TokenLifecycleManager};
use crate::domain::bridge::{InboundFrame, OutboundFrame, RequestId, Topic};
use crate::domain::session::{
    MicroAppIdentity, MicroAppSession, SessionDomainEvent, SessionEventEnvelope, SessionId,
    SessionSnapshot,
};
use crate::ports::bridge::{DevicePort, LocalDataStore, RendererChannel, RendererError};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// What the shell passes when it opens a micro-app.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionParams {
    pub app_id: String,
    pub app_name: String,
    pub client_id: String,
    pub web_view_uri: String,
    pub exchanged_token: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct BridgeOptions {
    /// Directory holding bundled micro-apps; relative load URIs resolve here.
    pub micro_app_root: PathBuf,
    pub api_base: Option<Url>,
    pub token_query_param: String,
    pub reply_timeout: Duration,
    pub is_developer: bool,
    pub exchange_scope: Option<String>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            micro_app_root: PathBuf::from("."),
            api_base: None,
            token_query_param: "token".to_string(),
            reply_timeout: Duration::from_secs(30),
            is_developer: false,
            exchange_scope: None,
        }
    }
}

/// Collaborators shared by every session of one host.
#[derive(Clone)]
pub struct BridgeDeps {
    pub registry: Arc<CapabilityRegistry>,
    pub auth: Arc<TokenLifecycleManager>,
    pub device: Arc<dyn DevicePort>,
    pub local_data: Arc<dyn LocalDataStore>,
    pub options: BridgeOptions,
}

/// Per-app access token as seen by capability handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TokenState {
    Pending,
    Ready(String),
    Unavailable(String),
}

pub(crate) struct SessionCore {
    pub(super) params: SessionParams,
    pub(super) deps: BridgeDeps,
    pub(super) ledger: PendingLedger,
    pub(super) token: watch::Sender<TokenState>,
    state: Mutex<MicroAppSession>,
    snapshots: watch::Sender<SessionSnapshot>,
    security: Mutex<Option<SecurityPolicy>>,
    renderer: Arc<dyn RendererChannel>,
}

impl SessionCore {
    fn lock_state(&self) -> MutexGuard<'_, MicroAppSession> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one aggregate transition and publishes the resulting snapshot.
    fn apply<T>(
        &self,
        transition: impl FnOnce(&mut MicroAppSession) -> Result<T, String>,
    ) -> Result<T, String> {
        let (outcome, snapshot) = {
            let mut state = self.lock_state();
            let outcome = transition(&mut state);
            (outcome, state.snapshot())
        };
        self.snapshots.send_replace(snapshot);
        outcome
    }

    pub(super) fn id(&self) -> SessionId {
        self.lock_state().id()
    }

    pub(super) fn snapshot(&self) -> SessionSnapshot {
        self.lock_state().snapshot()
    }

    pub(super) fn is_closed(&self) -> bool {
        self.lock_state().is_closed()
    }

    pub(super) fn is_totp(&self) -> bool {
        self.lock_state().is_totp()
    }

    pub(super) fn security_policy(&self) -> Option<SecurityPolicy> {
        self.security
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(super) fn set_scanner_visible(&self, visible: bool) -> Result<(), String> {
        if let Some(envelope) = self.apply(|state| state.set_scanner_visible(visible))? {
            self.record(&envelope);
        }
        Ok(())
    }

    fn post(&self, frame: &OutboundFrame) -> Result<(), RendererError> {
        self.renderer.post(frame)
    }

    fn record(&self, envelope: &SessionEventEnvelope) {
        let kind = envelope.event.kind();
        let session_id = &envelope.session_id;
        let app_id = self.params.app_id.as_str();
        match &envelope.event {
            SessionDomainEvent::ExchangeFailed { reason } => {
                warn!(event = kind, %session_id, app_id, %reason, "token exchange failed")
            }
            SessionDomainEvent::RendererError {
                reason: Some(reason),
            } => warn!(event = kind, %session_id, app_id, %reason, "renderer reported an error"),
            SessionDomainEvent::Ready { web_uri } => {
                let page = web_uri.split('?').next().unwrap_or_default();
                info!(event = kind, %session_id, app_id, page, "micro-app ready")
            }
            SessionDomainEvent::Closed { cancelled_requests } => {
                info!(event = kind, %session_id, app_id, cancelled_requests, "session closed")
            }
            _ => debug!(event = kind, %session_id, app_id, "session event"),
        }
    }
}

/// Owns one embedded micro-app: its per-app credential, UI flags and the
/// bridge protocol with its renderer.
#[derive(Clone)]
pub struct MicroAppSessionController {
    core: Arc<SessionCore>,
}

impl MicroAppSessionController {
    pub fn new(
        params: SessionParams,
        renderer: Arc<dyn RendererChannel>,
        deps: BridgeDeps,
    ) -> Result<Self, SessionError> {
        let identity = MicroAppIdentity::new(
            params.app_id.clone(),
            params.app_name.clone(),
            params.client_id.clone(),
        )
        .map_err(SessionError::InvalidParams)?;
        let session = MicroAppSession::new(identity, deps.options.is_developer);
        let (snapshots, _) = watch::channel(session.snapshot());
        let (token, _) = watch::channel(TokenState::Pending);
        Ok(Self {
            core: Arc::new(SessionCore {
                params,
                deps,
                ledger: PendingLedger::new(),
                token,
                state: Mutex::new(session),
                snapshots,
                security: Mutex::new(None),
                renderer,
            }),
        })
    }

    pub fn id(&self) -> SessionId {
        self.core.id()
    }

    pub fn params(&self) -> &SessionParams {
        &self.core.params
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.snapshot()
    }

    /// Snapshot stream for the UI layer; every state change is published.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.core.snapshots.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    pub fn pending_requests(&self) -> usize {
        self.core.ledger.len()
    }

    pub fn security_policy(&self) -> Option<SecurityPolicy> {
        self.core.security_policy()
    }

    /// Exchanges the per-app token and resolves the load URI. A failure
    /// leaves the session in the error phase; there is no retry.
    pub async fn initialize(&self) -> Result<SessionSnapshot, SessionError> {
        let core = &self.core;
        let envelope = core
            .apply(MicroAppSession::begin_exchange)
            .map_err(SessionError::Transition)?;
        core.record(&envelope);

        let request = MicroAppTokenRequest {
            app_id: core.params.app_id.clone(),
            client_id: core.params.client_id.clone(),
            exchanged_token: core.params.exchanged_token.clone(),
            scope: core.deps.options.exchange_scope.clone(),
        };
        let outcome = match core.deps.auth.exchange_micro_app_token(request).await {
            Ok(credential) => resolve_load_uri(
                &core.params.web_view_uri,
                &core.deps.options,
                &credential.access_token,
            )
            .map(|uri| (credential.access_token, uri))
            .map_err(SessionError::LoadUri),
            Err(err) => Err(SessionError::Exchange(err)),
        };

        match outcome {
            Ok((access_token, uri)) => {
                let options = &core.deps.options;
                let policy = SecurityPolicy::for_load_uri(
                    &uri,
                    &options.micro_app_root,
                    options.is_developer,
                );
                *core.security.lock().unwrap_or_else(PoisonError::into_inner) = Some(policy);
                let envelope = core
                    .apply(|state| state.complete_exchange(uri.to_string()))
                    .map_err(|_| SessionError::Closed)?;
                core.token.send_replace(TokenState::Ready(access_token));
                core.record(&envelope);
                Ok(self.snapshot())
            }
            Err(err) => {
                let reason = err.to_string();
                core.token.send_replace(TokenState::Unavailable(reason.clone()));
                let envelope = core
                    .apply(|state| state.fail_exchange(reason))
                    .map_err(|_| SessionError::Closed)?;
                core.record(&envelope);
                Err(err)
            }
        }
    }

    pub fn spawn_initialize(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            if let Err(err) = controller.initialize().await {
                debug!(
                    %err,
                    app_id = %controller.params().app_id,
                    "initialization ended without a ready session"
                );
            }
        })
    }

    /// Handles one frame posted by the renderer. Never fails: bad frames are
    /// logged and dropped, handler failures become error replies.
    pub async fn on_message(&self, raw: &str, origin: Option<&str>) {
        let core = &self.core;
        if core.is_closed() {
            debug!(app_id = %core.params.app_id, "frame after teardown ignored");
            return;
        }
        if let (Some(origin), Some(policy)) = (origin, core.security_policy()) {
            if !policy.allows(origin) {
                warn!(app_id = %core.params.app_id, origin, "frame from disallowed origin dropped");
                return;
            }
        }

        let frame = match InboundFrame::parse(raw) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, app_id = %core.params.app_id, "malformed bridge frame dropped");
                return;
            }
        };

        if let Some(request_id) = &frame.request_id {
            if let Some(pending) = core.ledger.take(request_id) {
                debug!(request_id = %request_id, topic = %pending.topic(), "reply correlated");
                let _ = match frame.into_outcome() {
                    Ok(data) => pending.resolve(data),
                    Err(message) => pending.reject(BridgeError::Remote(message)),
                };
                return;
            }
        }

        let Some(topic) = frame.topic.clone() else {
            debug!(request_id = ?frame.request_id, "reply without a pending request dropped");
            return;
        };
        let request_id = frame.request_id.clone();

        let Some(handler) = core.deps.registry.get(&topic) else {
            warn!(%topic, app_id = %core.params.app_id, "unsupported topic");
            if let Some(request_id) = request_id {
                self.post(OutboundFrame::error(
                    request_id,
                    format!("unsupported topic: {topic}"),
                ));
            }
            return;
        };

        let ctx = HandlerContext::new(core.clone(), topic.clone(), request_id.clone());
        let result = handler.handle(frame.data, ctx).await;

        if core.is_closed() {
            debug!(%topic, "handler finished after teardown; result discarded");
            return;
        }
        let Some(request_id) = request_id else {
            if let Err(err) = result {
                warn!(%err, %topic, "notification handler failed");
            }
            return;
        };
        let reply = match result {
            Ok(data) => OutboundFrame::reply(request_id, data),
            Err(err) => {
                warn!(%err, %topic, request_id = %request_id, "capability handler failed");
                OutboundFrame::error(request_id, err.to_string())
            }
        };
        self.post(reply);
    }

    /// Issues a request to the mini-app and waits for its reply.
    pub async fn send_to_micro_app(
        &self,
        topic: impl Into<Topic>,
        data: Value,
    ) -> Result<Value, BridgeError> {
        let core = &self.core;
        if core.is_closed() {
            return Err(BridgeError::Closed);
        }
        let topic = topic.into();
        let request_id = RequestId::generate();
        let reply = core.ledger.register(request_id.clone(), topic.clone())?;

        if let Err(err) = core.post(&OutboundFrame::request(request_id.clone(), topic, data)) {
            core.ledger.discard(&request_id);
            return Err(BridgeError::Renderer(err.to_string()));
        }

        let timeout = core.deps.options.reply_timeout;
        match tokio::time::timeout(timeout, reply).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(BridgeError::Cancelled),
            Err(_) => {
                core.ledger.discard(&request_id);
                warn!(request_id = %request_id, ?timeout, "mini-app reply timed out");
                Err(BridgeError::Timeout(timeout))
            }
        }
    }

    /// Rejects every pending request and closes the session. Returns the
    /// number of cancelled requests; a second call is a no-op.
    pub fn teardown(&self) -> usize {
        let core = &self.core;
        let cancelled = core.ledger.cancel_all();
        match core.apply(|state| state.close(cancelled)) {
            Ok(envelope) => {
                core.token
                    .send_replace(TokenState::Unavailable("session closed".to_string()));
                core.record(&envelope);
                cancelled
            }
            Err(_) => 0,
        }
    }

    pub fn report_renderer_error(&self, reason: impl Into<String>) -> Result<(), SessionError> {
        let reason = reason.into();
        let envelope = self
            .core
            .apply(|state| state.report_renderer_error(reason))
            .map_err(SessionError::Transition)?;
        self.core.record(&envelope);
        Ok(())
    }

    pub fn clear_renderer_error(&self) -> Result<(), SessionError> {
        let envelope = self
            .core
            .apply(MicroAppSession::clear_renderer_error)
            .map_err(SessionError::Transition)?;
        self.core.record(&envelope);
        Ok(())
    }

    fn post(&self, frame: OutboundFrame) {
        if let Err(err) = self.core.post(&frame) {
            warn!(%err, request_id = %frame.request_id, "failed to post frame to renderer");
        }
    }
}

/// Web URLs load as-is, developer URIs load as-is, anything else is a path
/// under the micro-app root. The per-app token is appended as a query
/// parameter.
pub fn resolve_load_uri(
    web_view_uri: &str,
    options: &BridgeOptions,
    access_token: &str,
) -> Result<Url, String> {
    let trimmed = web_view_uri.trim();
    if trimmed.is_empty() {
        return Err("no web view uri configured".to_string());
    }
    let is_web = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    let mut url = if is_web || options.is_developer {
        Url::parse(trimmed).map_err(|err| format!("{trimmed}: {err}"))?
    } else {
        let relative = Path::new(trimmed.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(format!("{trimmed}: escapes the micro-app root"));
        }
        let path = options.micro_app_root.join(relative);
        Url::from_file_path(&path)
            .map_err(|_| format!("{} is not an absolute path", path.display()))?
    };
    url.query_pairs_mut()
        .append_pair(&options.token_query_param, access_token);
    Ok(url)
}
