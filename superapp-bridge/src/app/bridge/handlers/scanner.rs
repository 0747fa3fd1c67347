use crate::app::bridge::context::HandlerContext;
use crate::app::bridge::error::HandlerError;
use serde_json::Value;
use tracing::debug;

pub const TOTP_PROMPT: &str = "Scan the QR code shown during authenticator setup";

/// `qr_request`: shows the scanner for the duration of one scan.
pub async fn qr_request(data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    let prompt = data
        .get("prompt")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| ctx.is_totp().then(|| TOTP_PROMPT.to_string()));

    ctx.set_scanner_visible(true)?;
    let scanned = ctx.device().scan_code(prompt.as_deref()).await;
    if let Err(err) = ctx.set_scanner_visible(false) {
        debug!(%err, "scanner flag left untouched");
    }
    Ok(Value::String(scanned?))
}

/// `qr_close`: hides the scanner without waiting for a code.
pub async fn qr_close(_data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    ctx.set_scanner_visible(false)?;
    Ok(Value::Null)
}
