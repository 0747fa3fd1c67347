use thiserror::Error;

/// Failure of a persistent key-value port.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(String),
    #[error("store contents are corrupted: {0}")]
    Corrupted(String),
}
