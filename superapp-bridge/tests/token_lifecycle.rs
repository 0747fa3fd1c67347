mod common;

use common::{jwt, FakeIdentity, FakeTransport, FixedClock, RecordingLogout, SHELL_EXP};
use serde_json::json;
use std::sync::Arc;
use superapp_bridge::adapters::auth::{FileTokenStore, InMemoryTokenStore};
use superapp_bridge::app::auth::{AuthError, MicroAppTokenRequest, TokenLifecycleManager};
use superapp_bridge::domain::credential::{CredentialSlot, SessionCredential};
use superapp_bridge::ports::auth::{ApiRequest, TokenStore, AUTHORIZATION_HEADER};

const REFRESHED_EXP: i64 = SHELL_EXP + 3600;

struct Fixture {
    manager: TokenLifecycleManager,
    store: Arc<dyn TokenStore>,
    identity: Arc<FakeIdentity>,
    transport: Arc<FakeTransport>,
    logout: Arc<RecordingLogout>,
}

fn fixture_with(store: Arc<dyn TokenStore>, now: i64) -> Fixture {
    let identity = Arc::new(FakeIdentity::new(jwt(REFRESHED_EXP)));
    let transport = Arc::new(FakeTransport::default());
    let logout = Arc::new(RecordingLogout::default());
    let manager = TokenLifecycleManager::new(
        store.clone(),
        identity.clone(),
        transport.clone(),
        Arc::new(FixedClock::at(now)),
        logout.clone(),
    );
    Fixture {
        manager,
        store,
        identity,
        transport,
        logout,
    }
}

fn fixture(now: i64) -> Fixture {
    let store = InMemoryTokenStore::with_shell_credential(
        SessionCredential::new(jwt(SHELL_EXP)).with_refresh_token("refresh-1"),
    );
    fixture_with(Arc::new(store), now)
}

fn bearer(request: &ApiRequest) -> &str {
    request.headers[AUTHORIZATION_HEADER].as_str()
}

#[tokio::test]
async fn token_is_used_as_is_one_second_before_expiry() {
    let fx = fixture(SHELL_EXP - 1);
    fx.transport.respond(200, json!({"ok": true}));

    let response = fx
        .manager
        .authorized_call(ApiRequest::get("https://api/x"), fx.logout.as_ref())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.body, json!({"ok": true}));
    assert_eq!(fx.identity.refreshes(), 0);
    assert_eq!(
        bearer(&fx.transport.requests()[0]),
        format!("Bearer {}", jwt(SHELL_EXP))
    );
}

#[tokio::test]
async fn expired_token_is_refreshed_once_before_the_call() {
    let fx = fixture(SHELL_EXP + 1);
    fx.transport.respond(200, json!({}));

    fx.manager
        .authorized_call(ApiRequest::get("https://api/x"), fx.logout.as_ref())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fx.identity.refreshes(), 1);
    let requests = fx.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(bearer(&requests[0]), format!("Bearer {}", jwt(REFRESHED_EXP)));

    let stored = fx.store.load(&CredentialSlot::Shell).await.unwrap().unwrap();
    assert_eq!(stored.access_token, jwt(REFRESHED_EXP));
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn single_unauthorized_response_is_retried_with_fresh_headers() {
    let fx = fixture(SHELL_EXP - 60);
    fx.transport.respond(401, json!({}));
    fx.transport.respond(200, json!({"data": 1}));

    let response = fx
        .manager
        .authorized_call(ApiRequest::get("https://api/x"), fx.logout.as_ref())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.status, 200);
    let requests = fx.transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(bearer(&requests[0]), format!("Bearer {}", jwt(SHELL_EXP)));
    assert_eq!(bearer(&requests[1]), format!("Bearer {}", jwt(REFRESHED_EXP)));
    assert_eq!(fx.logout.count(), 0);
}

#[tokio::test]
async fn second_unauthorized_response_is_terminal() {
    let fx = fixture(SHELL_EXP - 60);
    fx.transport.respond(401, json!({}));
    fx.transport.respond(401, json!({}));

    let result = fx
        .manager
        .authorized_call(ApiRequest::get("https://api/x"), fx.logout.as_ref())
        .await;

    assert!(matches!(result, Err(AuthError::Rejected)));
    assert_eq!(fx.transport.requests().len(), 2);
    assert_eq!(fx.identity.refreshes(), 1);
}

#[tokio::test]
async fn missing_refresh_token_signs_the_user_out() {
    let store = InMemoryTokenStore::with_shell_credential(SessionCredential::new(jwt(SHELL_EXP)));
    let fx = fixture_with(Arc::new(store), SHELL_EXP + 1);

    let result = fx
        .manager
        .authorized_call(ApiRequest::get("https://api/x"), fx.logout.as_ref())
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(fx.logout.count(), 1);
    assert!(fx.transport.requests().is_empty());
}

#[tokio::test]
async fn exchanged_credentials_are_isolated_per_app() {
    let fx = fixture(SHELL_EXP - 60);
    for (app_id, client_id) in [("payslip", "payslip-client"), ("calendar", "calendar-client")] {
        fx.manager
            .exchange_micro_app_token(MicroAppTokenRequest {
                app_id: app_id.into(),
                client_id: client_id.into(),
                exchanged_token: None,
                scope: None,
            })
            .await
            .unwrap();
    }

    let payslip = CredentialSlot::micro_app("payslip", "payslip-client");
    let calendar = CredentialSlot::micro_app("calendar", "calendar-client");
    assert_eq!(
        fx.store.load(&payslip).await.unwrap().unwrap().access_token,
        "payslip:payslip-client"
    );
    assert_eq!(
        fx.store.load(&calendar).await.unwrap().unwrap().access_token,
        "calendar:calendar-client"
    );
    assert_eq!(
        fx.store.load(&CredentialSlot::Shell).await.unwrap().unwrap().access_token,
        jwt(SHELL_EXP)
    );
    let exchanges = fx.identity.exchanges();
    assert!(exchanges
        .iter()
        .all(|exchange| exchange.subject_token == jwt(SHELL_EXP)));
}

#[tokio::test]
async fn file_store_keeps_credentials_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    {
        let store = FileTokenStore::open(path.clone()).unwrap();
        store
            .save(
                &CredentialSlot::Shell,
                SessionCredential::new(jwt(SHELL_EXP)).with_refresh_token("refresh-1"),
            )
            .await
            .unwrap();
        let fx = fixture_with(Arc::new(store), SHELL_EXP + 1);
        fx.manager
            .exchange_micro_app_token(MicroAppTokenRequest {
                app_id: "payslip".into(),
                client_id: "payslip-client".into(),
                exchanged_token: Some("handed-over".into()),
                scope: Some("payroll".into()),
            })
            .await
            .unwrap();
        assert_eq!(fx.identity.exchanges()[0].subject_token, "handed-over");
        assert_eq!(fx.identity.refreshes(), 0);
    }

    let reopened = FileTokenStore::open(path).unwrap();
    let credential = reopened
        .load(&CredentialSlot::micro_app("payslip", "payslip-client"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credential.access_token, "payslip:payslip-client");
}
