use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Logout collaborator invoked when the shell credential can no longer be refreshed.
#[async_trait]
pub trait LogoutHandler: Send + Sync {
    async fn logout(&self);
}
