use super::events::{SessionDomainEvent, SessionEventEnvelope};
use super::value_object::{MicroAppIdentity, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    ExchangingToken,
    Ready,
    Error,
    Closed,
}

/// Aggregate capturing the lifecycle of one embedded micro-app.
#[derive(Clone, Debug)]
pub struct MicroAppSession {
    id: SessionId,
    identity: MicroAppIdentity,
    phase: SessionPhase,
    web_uri: String,
    is_scanner_visible: bool,
    has_error: bool,
    is_developer: bool,
    is_totp: bool,
    created_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
}

impl MicroAppSession {
    pub fn new(identity: MicroAppIdentity, is_developer: bool) -> Self {
        let now = Utc::now();
        let is_totp = identity.is_totp();
        Self {
            id: SessionId::new(),
            identity,
            phase: SessionPhase::Uninitialized,
            web_uri: String::new(),
            is_scanner_visible: false,
            has_error: false,
            is_developer,
            is_totp,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id.clone()
    }

    pub fn identity(&self) -> &MicroAppIdentity {
        &self.identity
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.phase, SessionPhase::Closed)
    }

    pub fn is_totp(&self) -> bool {
        self.is_totp
    }

    pub fn is_developer(&self) -> bool {
        self.is_developer
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            app_id: self.identity.app_id.clone(),
            app_name: self.identity.app_name.clone(),
            phase: self.phase,
            web_uri: self.web_uri.clone(),
            is_scanner_visible: self.is_scanner_visible,
            has_error: self.has_error,
            is_developer: self.is_developer,
            is_totp: self.is_totp,
            created_at: self.created_at,
        }
    }

    pub fn begin_exchange(&mut self) -> Result<SessionEventEnvelope, String> {
        if self.phase != SessionPhase::Uninitialized {
            return Err(format!(
                "token exchange already started (phase {:?})",
                self.phase
            ));
        }
        self.phase = SessionPhase::ExchangingToken;
        Ok(self.emit(SessionDomainEvent::ExchangeStarted))
    }

    pub fn complete_exchange(
        &mut self,
        web_uri: impl Into<String>,
    ) -> Result<SessionEventEnvelope, String> {
        self.require(SessionPhase::ExchangingToken, "complete token exchange")?;
        let web_uri = web_uri.into();
        self.web_uri = web_uri.clone();
        self.phase = SessionPhase::Ready;
        Ok(self.emit(SessionDomainEvent::Ready { web_uri }))
    }

    pub fn fail_exchange(
        &mut self,
        reason: impl Into<String>,
    ) -> Result<SessionEventEnvelope, String> {
        self.require(SessionPhase::ExchangingToken, "fail token exchange")?;
        self.web_uri.clear();
        self.has_error = true;
        self.phase = SessionPhase::Error;
        Ok(self.emit(SessionDomainEvent::ExchangeFailed {
            reason: reason.into(),
        }))
    }

    /// Returns `None` when the flag already had the requested value.
    pub fn set_scanner_visible(
        &mut self,
        visible: bool,
    ) -> Result<Option<SessionEventEnvelope>, String> {
        self.require(SessionPhase::Ready, "toggle the scanner")?;
        if self.is_scanner_visible == visible {
            return Ok(None);
        }
        self.is_scanner_visible = visible;
        Ok(Some(self.emit(SessionDomainEvent::ScannerToggled { visible })))
    }

    pub fn report_renderer_error(
        &mut self,
        reason: impl Into<String>,
    ) -> Result<SessionEventEnvelope, String> {
        self.require(SessionPhase::Ready, "report a renderer error")?;
        self.has_error = true;
        Ok(self.emit(SessionDomainEvent::RendererError {
            reason: Some(reason.into()),
        }))
    }

    pub fn clear_renderer_error(&mut self) -> Result<SessionEventEnvelope, String> {
        self.require(SessionPhase::Ready, "clear a renderer error")?;
        self.has_error = false;
        Ok(self.emit(SessionDomainEvent::RendererError { reason: None }))
    }

    pub fn close(&mut self, cancelled_requests: usize) -> Result<SessionEventEnvelope, String> {
        if self.is_closed() {
            return Err("session already closed".into());
        }
        self.phase = SessionPhase::Closed;
        self.is_scanner_visible = false;
        Ok(self.emit(SessionDomainEvent::Closed { cancelled_requests }))
    }

    fn require(&self, expected: SessionPhase, action: &str) -> Result<(), String> {
        if self.phase != expected {
            return Err(format!(
                "cannot {action} in phase {:?} (expected {expected:?})",
                self.phase
            ));
        }
        Ok(())
    }

    fn emit(&mut self, event: SessionDomainEvent) -> SessionEventEnvelope {
        self.last_active_at = Utc::now();
        SessionEventEnvelope::new(self.id.clone(), event)
    }
}

/// UI-facing view of a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub app_id: String,
    pub app_name: String,
    pub phase: SessionPhase,
    pub web_uri: String,
    pub is_scanner_visible: bool,
    pub has_error: bool,
    pub is_developer: bool,
    pub is_totp: bool,
    pub created_at: DateTime<Utc>,
}
