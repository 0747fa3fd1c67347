pub mod retry;
pub mod service;

pub use retry::AuthRetry;
pub use service::{AuthError, MicroAppTokenRequest, TokenLifecycleManager};
