use crate::app::bridge::context::HandlerContext;
use crate::app::bridge::error::HandlerError;
use crate::ports::auth::ApiRequest;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

const TOKEN_PATH: &str = "micro-app-token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MicroAppTokenBody {
    token: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

/// `micro_app_token`: fetches a backend token for this app on behalf of the
/// signed-in user through an authorized call.
pub async fn micro_app_token(_data: Value, ctx: HandlerContext) -> Result<Value, HandlerError> {
    let user_id = ctx
        .user_id()
        .ok_or_else(|| HandlerError::Failed("user id is not available".to_string()))?;
    let api_base = ctx
        .options()
        .api_base
        .clone()
        .ok_or_else(|| HandlerError::Failed("api base url is not configured".to_string()))?;

    let mut url = Url::parse(&format!(
        "{}/{TOKEN_PATH}",
        api_base.as_str().trim_end_matches('/')
    ))
    .map_err(|err| HandlerError::Failed(err.to_string()))?;
    url.query_pairs_mut()
        .append_pair("emp_id", user_id)
        .append_pair("micro_app_id", ctx.app_id());

    let request = ApiRequest::get(url.to_string()).with_timeout(REQUEST_TIMEOUT);
    let logout = ctx.auth().default_logout();
    let response = ctx
        .auth()
        .authorized_call(request, logout.as_ref())
        .await?
        .ok_or_else(|| HandlerError::Unauthenticated("shell session expired".to_string()))?;

    let body: MicroAppTokenBody = serde_json::from_value(response.body)?;
    Ok(json!({
        "token": body.token,
        "expiresAt": body.expires_at,
        "app_id": ctx.app_id(),
    }))
}
