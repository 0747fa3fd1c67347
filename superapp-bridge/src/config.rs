use crate::app::bridge::BridgeOptions;
use crate::ports::bridge::ConfirmChoice;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:17817";
pub const DEFAULT_CLIENT_ID: &str = "superapp-shell";
pub const DEFAULT_TOKEN_QUERY_PARAM: &str = "token";
const DEFAULT_REPLY_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// One layer of host configuration. Both the TOML file and the command line
/// produce one; [`HostConfig::or`] stacks them.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub listen: Option<SocketAddr>,
    pub state_dir: Option<PathBuf>,
    pub token_endpoint: Option<String>,
    pub api_base: Option<String>,
    pub client_id: Option<String>,
    pub micro_app_root: Option<PathBuf>,
    pub developer: Option<bool>,
    pub reply_timeout_ms: Option<u64>,
    pub http_timeout_ms: Option<u64>,
    pub token_query_param: Option<String>,
    pub exchange_scope: Option<String>,
    pub confirm_default: Option<String>,
}

impl HostConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Values set on `self` win over `fallback`.
    pub fn or(self, fallback: HostConfig) -> HostConfig {
        HostConfig {
            listen: self.listen.or(fallback.listen),
            state_dir: self.state_dir.or(fallback.state_dir),
            token_endpoint: self.token_endpoint.or(fallback.token_endpoint),
            api_base: self.api_base.or(fallback.api_base),
            client_id: self.client_id.or(fallback.client_id),
            micro_app_root: self.micro_app_root.or(fallback.micro_app_root),
            developer: self.developer.or(fallback.developer),
            reply_timeout_ms: self.reply_timeout_ms.or(fallback.reply_timeout_ms),
            http_timeout_ms: self.http_timeout_ms.or(fallback.http_timeout_ms),
            token_query_param: self.token_query_param.or(fallback.token_query_param),
            exchange_scope: self.exchange_scope.or(fallback.exchange_scope),
            confirm_default: self.confirm_default.or(fallback.confirm_default),
        }
    }

    pub fn into_settings(self) -> anyhow::Result<Settings> {
        let listen = match self.listen {
            Some(listen) => listen,
            None => DEFAULT_LISTEN.parse()?,
        };
        let token_endpoint = self
            .token_endpoint
            .ok_or_else(|| anyhow!("token_endpoint is required"))?;
        let token_endpoint = Url::parse(&token_endpoint)
            .with_context(|| format!("invalid token_endpoint {token_endpoint}"))?;
        let api_base = self
            .api_base
            .map(|base| Url::parse(&base).with_context(|| format!("invalid api_base {base}")))
            .transpose()?;
        let confirm_default = match self.confirm_default.as_deref() {
            None | Some("cancel") => ConfirmChoice::Cancel,
            Some("confirm") => ConfirmChoice::Confirm,
            Some(other) => {
                return Err(anyhow!(
                    "confirm_default must be confirm or cancel, got {other}"
                ))
            }
        };
        let token_query_param = self
            .token_query_param
            .unwrap_or_else(|| DEFAULT_TOKEN_QUERY_PARAM.to_string());
        if token_query_param.trim().is_empty() {
            return Err(anyhow!("token_query_param cannot be empty"));
        }

        Ok(Settings {
            listen,
            state_dir: self.state_dir.unwrap_or_else(|| PathBuf::from("state")),
            token_endpoint,
            api_base,
            client_id: self
                .client_id
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            micro_app_root: self
                .micro_app_root
                .unwrap_or_else(|| PathBuf::from("micro-apps")),
            developer: self.developer.unwrap_or(false),
            reply_timeout: Duration::from_millis(
                self.reply_timeout_ms.unwrap_or(DEFAULT_REPLY_TIMEOUT_MS),
            ),
            http_timeout: Duration::from_millis(
                self.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS),
            ),
            token_query_param,
            exchange_scope: self.exchange_scope,
            confirm_default,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub listen: SocketAddr,
    pub state_dir: PathBuf,
    pub token_endpoint: Url,
    pub api_base: Option<Url>,
    pub client_id: String,
    pub micro_app_root: PathBuf,
    pub developer: bool,
    pub reply_timeout: Duration,
    pub http_timeout: Duration,
    pub token_query_param: String,
    pub exchange_scope: Option<String>,
    pub confirm_default: ConfirmChoice,
}

impl Settings {
    pub fn bridge_options(&self, micro_app_root: PathBuf) -> BridgeOptions {
        BridgeOptions {
            micro_app_root,
            api_base: self.api_base.clone(),
            token_query_param: self.token_query_param.clone(),
            reply_timeout: self.reply_timeout,
            is_developer: self.developer,
            exchange_scope: self.exchange_scope.clone(),
        }
    }
}
