/// Progress of one authorized call through the refresh-and-retry rule.
/// At most one retry follows a 401; a second 401 is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthRetry {
    Fresh,
    Refreshing,
    RetryOnce,
    Failed,
}

impl AuthRetry {
    pub fn on_unauthorized(self) -> Self {
        match self {
            AuthRetry::Fresh => AuthRetry::Refreshing,
            AuthRetry::Refreshing | AuthRetry::RetryOnce | AuthRetry::Failed => AuthRetry::Failed,
        }
    }

    pub fn on_refreshed(self) -> Self {
        match self {
            AuthRetry::Refreshing => AuthRetry::RetryOnce,
            other => other,
        }
    }

    pub fn may_send(self) -> bool {
        matches!(self, AuthRetry::Fresh | AuthRetry::RetryOnce)
    }
}
