use crate::domain::bridge::OutboundFrame;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("renderer channel closed")]
    Closed,
    #[error("renderer rejected frame: {0}")]
    Rejected(String),
}

/// Posts frames into the embedded renderer's script context. Posting never
/// waits on the mini-app.
pub trait RendererChannel: Send + Sync {
    fn post(&self, frame: &OutboundFrame) -> Result<(), RendererError>;
}
