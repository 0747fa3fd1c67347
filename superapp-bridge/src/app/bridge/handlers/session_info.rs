use crate::app::bridge::context::HandlerContext;
use crate::app::bridge::error::HandlerError;
use serde_json::Value;

/// `token`: the per-app access token, once the exchange has finished.
pub async fn token(_data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    ctx.access_token().await.map(Value::String)
}

/// `user_id`: the user the session was opened for.
pub async fn user_id(_data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    ctx.user_id()
        .map(|user| Value::String(user.to_string()))
        .ok_or_else(|| HandlerError::Failed("user id is not available".to_string()))
}
