use crate::app::bridge::context::HandlerContext;
use crate::app::bridge::error::HandlerError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
struct SaveRequest {
    key: String,
    value: Value,
}

#[derive(Deserialize)]
struct GetRequest {
    key: String,
}

fn require_key(key: &str) -> Result<(), HandlerError> {
    if key.trim().is_empty() {
        return Err(HandlerError::InvalidPayload("key cannot be empty".to_string()));
    }
    Ok(())
}

/// `save_local_data`: non-string values are stored as their JSON text.
pub async fn save(data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    let request: SaveRequest = serde_json::from_value(data)?;
    require_key(&request.key)?;
    let value = match request.value {
        Value::String(text) => text,
        other => other.to_string(),
    };
    ctx.local_data()
        .set(ctx.app_id(), &request.key, value)
        .await?;
    Ok(Value::Null)
}

pub async fn get(data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    let request: GetRequest = serde_json::from_value(data)?;
    require_key(&request.key)?;
    let value = ctx.local_data().get(ctx.app_id(), &request.key).await?;
    Ok(json!({ "value": value }))
}
