use super::value_object::SessionId;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq)]
pub enum SessionDomainEvent {
    ExchangeStarted,
    Ready { web_uri: String },
    ExchangeFailed { reason: String },
    ScannerToggled { visible: bool },
    RendererError { reason: Option<String> },
    Closed { cancelled_requests: usize },
}

impl SessionDomainEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionDomainEvent::ExchangeStarted => "bridge.session.exchange_started",
            SessionDomainEvent::Ready { .. } => "bridge.session.ready",
            SessionDomainEvent::ExchangeFailed { .. } => "bridge.session.failed",
            SessionDomainEvent::ScannerToggled { .. } => "bridge.session.scanner",
            SessionDomainEvent::RendererError { .. } => "bridge.session.renderer_error",
            SessionDomainEvent::Closed { .. } => "bridge.session.closed",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionEventEnvelope {
    pub session_id: SessionId,
    pub occurred_at: DateTime<Utc>,
    pub event: SessionDomainEvent,
}

impl SessionEventEnvelope {
    pub fn new(session_id: SessionId, event: SessionDomainEvent) -> Self {
        Self {
            session_id,
            occurred_at: Utc::now(),
            event,
        }
    }
}
