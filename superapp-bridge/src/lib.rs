pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;

pub use config::{HostConfig, Settings};

use adapters::auth::{
    ClearShellCredentials, FileTokenStore, HttpIdentityProvider, ReqwestTransport, SystemClock,
};
use adapters::bridge::{ChannelRenderer, HeadlessDevice};
use adapters::storage::FileLocalDataStore;
use anyhow::Context;
use app::auth::TokenLifecycleManager;
use app::bridge::{
    core_registry, BridgeDeps, BridgeError, MicroAppSessionController, SessionError,
    SessionParams,
};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use domain::credential::{CredentialSlot, SessionCredential};
use domain::session::{SessionId, SessionSnapshot};
use futures::{SinkExt, StreamExt};
use ports::auth::{LogoutHandler, TokenStore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

/// Live sessions keyed by id, one per connected renderer.
#[derive(Clone, Default)]
pub struct SessionDirectory {
    inner: Arc<RwLock<HashMap<SessionId, MicroAppSessionController>>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, controller: MicroAppSessionController) {
        self.inner.write().await.insert(controller.id(), controller);
    }

    pub async fn remove(&self, id: &SessionId) -> Option<MicroAppSessionController> {
        self.inner.write().await.remove(id)
    }

    pub async fn get(&self, id: &SessionId) -> Option<MicroAppSessionController> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn list(&self) -> Vec<SessionSnapshot> {
        let mut snapshots: Vec<SessionSnapshot> = self
            .inner
            .read()
            .await
            .values()
            .map(MicroAppSessionController::snapshot)
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.created_at);
        snapshots
    }
}

#[derive(Clone)]
pub struct AppState {
    deps: BridgeDeps,
    token_store: Arc<dyn TokenStore>,
    logout: Arc<dyn LogoutHandler>,
    sessions: SessionDirectory,
}

impl AppState {
    pub fn new(
        deps: BridgeDeps,
        token_store: Arc<dyn TokenStore>,
        logout: Arc<dyn LogoutHandler>,
    ) -> Self {
        Self {
            deps,
            token_store,
            logout,
            sessions: SessionDirectory::new(),
        }
    }

    pub fn deps(&self) -> &BridgeDeps {
        &self.deps
    }

    pub fn sessions(&self) -> &SessionDirectory {
        &self.sessions
    }
}

/// Wires the file-backed stores, HTTP adapters and headless device from
/// `settings`.
pub async fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    tokio::fs::create_dir_all(&settings.state_dir)
        .await
        .with_context(|| format!("creating state dir {}", settings.state_dir.display()))?;

    let token_store: Arc<dyn TokenStore> = Arc::new(
        FileTokenStore::open(settings.state_dir.join("tokens.json"))
            .context("opening token store")?,
    );
    let local_data = Arc::new(
        FileLocalDataStore::open(settings.state_dir.join("local_data.json"))
            .context("opening local data store")?,
    );
    let identity = Arc::new(HttpIdentityProvider::new(
        settings.token_endpoint.clone(),
        settings.client_id.clone(),
        settings.http_timeout,
    ));
    let transport =
        Arc::new(ReqwestTransport::new(settings.http_timeout).context("building http client")?);
    let logout: Arc<dyn LogoutHandler> = Arc::new(ClearShellCredentials::new(token_store.clone()));
    let auth = Arc::new(TokenLifecycleManager::new(
        token_store.clone(),
        identity,
        transport,
        Arc::new(SystemClock),
        logout.clone(),
    ));

    let micro_app_root = if settings.micro_app_root.is_absolute() {
        settings.micro_app_root.clone()
    } else {
        std::env::current_dir()
            .context("resolving micro-app root")?
            .join(&settings.micro_app_root)
    };

    let deps = BridgeDeps {
        registry: Arc::new(core_registry()),
        auth,
        device: Arc::new(HeadlessDevice::new(settings.confirm_default)),
        local_data,
        options: settings.bridge_options(micro_app_root),
    };
    Ok(AppState::new(deps, token_store, logout))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/capabilities", get(list_capabilities))
        .route(
            "/auth/credential",
            put(install_credential).delete(remove_credential),
        )
        .route("/microapps/:app_id/bridge", get(bridge_ws_upgrade))
        .route("/sessions", get(list_sessions))
        .route("/sessions/:session_id/messages", post(send_to_session))
        .with_state(state)
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let state = build_state(&settings).await?;
    let app = router(state);

    let listener = TcpListener::bind(settings.listen)
        .await
        .with_context(|| format!("binding {}", settings.listen))?;
    info!(
        "listening" = %settings.listen,
        "state_dir" = %settings.state_dir.display(),
        "developer" = settings.developer,
        "msg" = "superapp-bridge started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = ctrl_c().await;
    info!("msg" = "shutdown signal received");
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn list_capabilities(State(state): State<AppState>) -> impl IntoResponse {
    let topics: Vec<String> = state
        .deps
        .registry
        .topics()
        .iter()
        .map(|topic| topic.name().to_string())
        .collect();
    Json(json!({ "topics": topics }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRequest {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Installs the shell credential obtained by the sign-in flow.
async fn install_credential(
    State(state): State<AppState>,
    Json(request): Json<CredentialRequest>,
) -> Result<StatusCode, ApiError> {
    if request.access_token.trim().is_empty() {
        return Err(ApiError::invalid(
            "invalid_credential",
            "accessToken cannot be empty",
        ));
    }
    let mut credential = SessionCredential::new(request.access_token);
    if let Some(refresh_token) = request.refresh_token {
        credential = credential.with_refresh_token(refresh_token);
    }
    state
        .token_store
        .save(&CredentialSlot::Shell, credential)
        .await
        .map_err(|err| ApiError::internal("store_failure", err.to_string()))?;
    info!("msg" = "shell credential installed");
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_credential(State(state): State<AppState>) -> StatusCode {
    state.logout.logout().await;
    StatusCode::NO_CONTENT
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSnapshot>> {
    Json(state.sessions.list().await)
}

#[derive(Debug, Deserialize)]
struct BridgeQuery {
    client_id: String,
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    web_view_uri: Option<String>,
    #[serde(default)]
    exchanged_token: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

async fn bridge_ws_upgrade(
    ws: WebSocketUpgrade,
    Path(app_id): Path<String>,
    Query(query): Query<BridgeQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let params = SessionParams {
        app_name: query.app_name.unwrap_or_else(|| app_id.clone()),
        app_id,
        client_id: query.client_id,
        web_view_uri: query.web_view_uri.unwrap_or_default(),
        exchanged_token: query.exchanged_token,
        user_id: query.user_id,
    };
    let (renderer, outbound) = ChannelRenderer::pair();
    let controller =
        MicroAppSessionController::new(params, Arc::new(renderer), state.deps.clone())
            .map_err(ApiError::from)?;

    Ok(ws.on_upgrade(move |socket| {
        handle_bridge_socket(socket, state, controller, outbound, origin)
    }))
}

async fn handle_bridge_socket(
    socket: WebSocket,
    state: AppState,
    controller: MicroAppSessionController,
    mut outbound: mpsc::UnboundedReceiver<String>,
    origin: Option<String>,
) {
    let session_id = controller.id();
    let app_id = controller.params().app_id.clone();
    state.sessions.insert(controller.clone()).await;
    info!(%session_id, %app_id, "msg" = "bridge socket opened");

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(err) = sink.send(Message::Text(frame)).await {
                debug!(%err, "bridge socket writer stopped");
                break;
            }
        }
    });

    controller.spawn_initialize();

    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(msg) => msg,
            Err(err) => {
                warn!(%err, %session_id, "WebSocket receive error");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                let controller = controller.clone();
                let origin = origin.clone();
                tokio::spawn(async move {
                    controller.on_message(&text, origin.as_deref()).await;
                });
            }
            Message::Binary(_) => {
                warn!(%session_id, "binary bridge frame ignored");
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => break,
        }
    }

    let cancelled = controller.teardown();
    state.sessions.remove(&session_id).await;
    writer.abort();
    info!(%session_id, %app_id, cancelled, "msg" = "bridge socket closed");
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    topic: String,
    #[serde(default)]
    data: Value,
}

async fn send_to_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SendRequest>,
) -> Result<Json<Value>, ApiError> {
    let session_id: SessionId = session_id
        .parse()
        .map_err(|err: String| ApiError::invalid("invalid_session_id", err))?;
    let controller = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| ApiError::not_found("session_not_found", session_id.to_string()))?;
    let topic = request
        .topic
        .parse::<domain::bridge::Topic>()
        .map_err(|err| ApiError::invalid("invalid_topic", err))?;

    let data = controller
        .send_to_micro_app(topic, request.data)
        .await
        .map_err(bridge_error_to_api)?;
    Ok(Json(json!({ "data": data })))
}

fn bridge_error_to_api(err: BridgeError) -> ApiError {
    let message = err.to_string();
    match err {
        BridgeError::Timeout(_) => {
            ApiError::new(StatusCode::GATEWAY_TIMEOUT, "reply_timeout", message)
        }
        BridgeError::Cancelled | BridgeError::Closed => {
            ApiError::new(StatusCode::GONE, "session_closed", message)
        }
        BridgeError::Remote(_) => {
            ApiError::new(StatusCode::BAD_GATEWAY, "micro_app_error", message)
        }
        BridgeError::Renderer(_) => {
            ApiError::new(StatusCode::BAD_GATEWAY, "renderer_unavailable", message)
        }
        BridgeError::DuplicateRequest(_) => ApiError::internal("duplicate_request", message),
    }
}

impl From<SessionError> for ApiError {
    fn from(value: SessionError) -> Self {
        ApiError::invalid("invalid_session", value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}
