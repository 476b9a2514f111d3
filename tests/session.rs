use chrono::{Duration, Utc};
use httpmock::prelude::*;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;
use tempfile::TempDir;

use fraud_console::services::auth::{AuthError, IdentityProvider, Session, SessionStore, TokenSet};

fn jwt(claims: serde_json::Value) -> String {
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test")).unwrap()
}

fn expiring_in(secs: i64) -> String {
    jwt(json!({"exp": (Utc::now() + Duration::seconds(secs)).timestamp(), "username": "analyst"}))
}

fn session_for(server: &MockServer) -> Session {
    let idp = IdentityProvider::new(&server.base_url(), "client-1", "http://localhost:3000/", "http://localhost:3000/");
    Session::new(idp, Duration::seconds(30))
}

#[tokio::test]
async fn test_token_refreshed_inside_leeway() {
    let server = MockServer::start_async().await;
    let fresh = expiring_in(3600);
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .body_contains("grant_type=refresh_token")
                .body_contains("refresh_token=r-1")
                .body_contains("client_id=client-1");
            then.status(200).json_body(json!({"access_token": fresh, "expires_in": 3600}));
        })
        .await;

    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("session.json");
    let session = session_for(&server).with_store(SessionStore::new(&store_path));
    session
        .sign_in(TokenSet::new(expiring_in(10), Some("r-1".to_string())))
        .await
        .unwrap();

    assert_eq!(session.access_token().await.unwrap(), fresh);
    mock.assert_async().await;

    // The refresh token is kept and the new set is persisted
    let saved = SessionStore::new(&store_path).load().await.unwrap().unwrap();
    assert_eq!(saved.access_token, fresh);
    assert_eq!(saved.refresh_token.as_deref(), Some("r-1"));

    // Still valid: no second grant
    assert_eq!(session.access_token().await.unwrap(), fresh);
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_valid_token_used_without_refresh() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(500);
        })
        .await;

    let session = session_for(&server);
    let token = expiring_in(3600);
    session
        .sign_in(TokenSet::new(token.clone(), Some("r-1".to_string())))
        .await
        .unwrap();

    assert_eq!(session.access_token().await.unwrap(), token);
    assert_eq!(session.username().await.as_deref(), Some("analyst"));
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_rejected_refresh() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(400).json_body(json!({"error": "invalid_grant"}));
        })
        .await;

    let session = session_for(&server);
    session
        .sign_in(TokenSet::new(expiring_in(-60), Some("revoked".to_string())))
        .await
        .unwrap();

    assert!(session.is_authenticated().await);
    match session.access_token().await {
        Err(AuthError::Rejected { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected rejected refresh, got {other:?}"),
    }
}

#[tokio::test]
async fn test_complete_sign_in_exchanges_code() {
    let server = MockServer::start_async().await;
    let id_token = jwt(json!({"cognito:username": "jdoe", "email": "jdoe@example.com"}));
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .body_contains("grant_type=authorization_code")
                .body_contains("code=abc123");
            then.status(200).json_body(json!({
                "access_token": expiring_in(3600),
                "id_token": id_token,
                "refresh_token": "r-2",
                "expires_in": 3600
            }));
        })
        .await;

    let session = session_for(&server);
    session.complete_sign_in("abc123").await.unwrap();

    mock.assert_async().await;
    assert!(session.is_authenticated().await);
    assert_eq!(session.username().await.as_deref(), Some("jdoe"));
}

#[tokio::test]
async fn test_session_survives_restart_and_sign_out_clears_it() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("session.json");
    let idp = || IdentityProvider::new("https://auth.example.com", "client-1", "http://localhost:3000/", "http://localhost:3000/bye");

    let first = Session::new(idp(), Duration::seconds(30)).with_store(SessionStore::new(&store_path));
    assert!(!first.restore().await.unwrap());
    first
        .sign_in(TokenSet::new("opaque-token", Some("r-3".to_string())))
        .await
        .unwrap();

    let second = Session::new(idp(), Duration::seconds(30)).with_store(SessionStore::new(&store_path));
    assert!(second.restore().await.unwrap());
    assert!(second.is_authenticated().await);
    assert_eq!(second.access_token().await.unwrap(), "opaque-token");

    let logout = second.sign_out().await.unwrap();
    assert_eq!(logout.path(), "/logout");
    assert!(!second.is_authenticated().await);
    assert!(!store_path.exists());
}

#[tokio::test]
async fn test_corrupt_session_file() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("session.json");
    std::fs::write(&store_path, b"{not json").unwrap();

    let store = SessionStore::new(&store_path);
    assert!(matches!(store.load().await, Err(AuthError::Parse(_))));
}
