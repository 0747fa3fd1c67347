use crate::domain::bridge::OutboundFrame;
use crate::ports::bridge::{RendererChannel, RendererError};
use tokio::sync::mpsc;

/// Renderer backed by an unbounded queue drained by the socket writer.
#[derive(Clone)]
pub struct ChannelRenderer {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelRenderer {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    pub fn pair() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl RendererChannel for ChannelRenderer {
    fn post(&self, frame: &OutboundFrame) -> Result<(), RendererError> {
        let json = frame
            .to_json()
            .map_err(|err| RendererError::Rejected(err.to_string()))?;
        self.tx.send(json).map_err(|_| RendererError::Closed)
    }
}
