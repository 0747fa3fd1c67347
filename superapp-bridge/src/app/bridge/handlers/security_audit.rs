use crate::app::bridge::context::HandlerContext;
use crate::app::bridge::error::HandlerError;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

static SUSPICIOUS_CONTENT: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<script\b[^>]*>.*?</script\s*>",
        r"(?i)javascript:",
        r"(?i)\bon\w+\s*=",
        r"(?i)<iframe\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid content pattern"))
    .collect()
});

pub fn is_suspicious(content: &str) -> bool {
    SUSPICIOUS_CONTENT
        .iter()
        .any(|pattern| pattern.is_match(content))
}

#[derive(Deserialize)]
struct AuditRequest {
    action: String,
    #[serde(default)]
    data: Value,
}

pub async fn security_audit(data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    let request: AuditRequest = serde_json::from_value(data)?;
    match request.action.as_str() {
        "report_security_event" => {
            warn!(
                event = "bridge.security.reported",
                app_id = ctx.app_id(),
                session_id = %ctx.session_id(),
                details = %request.data,
                "mini-app reported a security event"
            );
            Ok(json!({ "logged": true }))
        }
        "get_security_status" => Ok(json!({
            "bridgeSecured": true,
            "originValidated": ctx.security_policy().is_some(),
            "appId": ctx.app_id(),
            "timestamp": Utc::now().timestamp_millis(),
        })),
        "validate_content" => {
            let content = request
                .data
                .get("content")
                .and_then(Value::as_str)
                .ok_or_else(|| HandlerError::InvalidPayload("invalid content type".to_string()))?;
            if is_suspicious(content) {
                warn!(
                    event = "bridge.security.suspicious_content",
                    app_id = ctx.app_id(),
                    "suspicious content detected"
                );
                Ok(json!({ "safe": false, "reason": "potentially malicious content detected" }))
            } else {
                Ok(json!({ "safe": true }))
            }
        }
        other => Err(HandlerError::InvalidPayload(format!(
            "unknown security audit action: {other}"
        ))),
    }
}
