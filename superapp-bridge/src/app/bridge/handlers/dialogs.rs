use crate::app::bridge::context::HandlerContext;
use crate::app::bridge::error::HandlerError;
use crate::ports::bridge::{AlertRequest, ConfirmRequest};
use serde_json::Value;

pub async fn alert(data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    let request: AlertRequest = serde_json::from_value(data)?;
    ctx.device().alert(request).await?;
    Ok(Value::Null)
}

/// `confirm_alert`: resolves with `"confirm"` or `"cancel"`.
pub async fn confirm_alert(data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    let request: ConfirmRequest = serde_json::from_value(data)?;
    let choice = ctx.device().confirm(request).await?;
    Ok(serde_json::to_value(choice)?)
}
