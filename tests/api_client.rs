use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;

use fraud_console::services::api::{ApiClient, ApiError, Backend, RequestOptions};
use fraud_console::services::auth::{IdentityProvider, Session, TokenSet};

#[tokio::test]
async fn test_get_sends_bearer_and_json_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/prompts")
                .header("authorization", "Bearer tok")
                .header("content-type", "application/json")
                .header("x-trace", "abc");
            then.status(200).json_body(json!([{"pk": "P1"}]));
        })
        .await;

    let client = ApiClient::new(&server.base_url());
    let options = RequestOptions {
        headers: vec![("X-Trace".to_string(), "abc".to_string())],
        body: None,
    };
    let value = client.get("/prompts", Some("tok"), options).await.unwrap();

    mock.assert_async().await;
    assert_eq!(value, json!([{"pk": "P1"}]));
}

#[tokio::test]
async fn test_query_string_passed_verbatim() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/prompts")
                .query_param("prompt_id", "P1")
                .json_body(json!({"role": "Analyst"}));
            then.status(200).json_body(json!({"updated": true}));
        })
        .await;

    let client = ApiClient::new(&format!("{}/", server.base_url()));
    let value = client
        .put("/prompts?prompt_id=P1", Some("tok"), RequestOptions::json(json!({"role": "Analyst"})))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(value["updated"], true);
}

#[tokio::test]
async fn test_post_without_body_sends_empty_object() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/agent/verify").json_body(json!({}));
            then.status(201).json_body(json!({"verification_id": "v1"}));
        })
        .await;

    let client = ApiClient::new(&server.base_url());
    let value = client
        .post("/agent/verify", Some("tok"), RequestOptions::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(value["verification_id"], "v1");
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/prompts");
            then.status(400).json_body(json!({"message": "Role is too long"}));
        })
        .await;

    let client = ApiClient::new(&server.base_url());
    let err = client
        .post("/prompts", Some("tok"), RequestOptions::json(json!({"role": "x"})))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(reqwest::StatusCode::BAD_REQUEST));
    assert_eq!(err.user_message(), "Role is too long");
}

#[tokio::test]
async fn test_error_status_with_plain_text_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/verifications");
            then.status(502).body("Bad Gateway");
        })
        .await;

    let client = ApiClient::new(&server.base_url());
    let err = client
        .get("/verifications", Some("tok"), RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { body: None, .. }));
    assert_eq!(err.user_message(), "Error: 502");
}

#[tokio::test]
async fn test_delete_tolerates_empty_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/prompts").query_param("prompt_id", "P1");
            then.status(204);
        })
        .await;

    let client = ApiClient::new(&server.base_url());
    let value = client
        .delete("/prompts?prompt_id=P1", Some("tok"), RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn test_get_rejects_non_json_success() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/prompts");
            then.status(200).body("<html></html>");
        })
        .await;

    let client = ApiClient::new(&server.base_url());
    let err = client
        .get("/prompts", Some("tok"), RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn test_missing_token_without_session() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path("/prompts");
            then.status(200).json_body(json!({}));
        })
        .await;

    let client = ApiClient::new(&server.base_url());
    let err = client.get("/prompts", Some(""), RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, ApiError::MissingToken));
    assert!(err.is_auth());
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_token_fetched_from_session() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/configurations")
                .header("authorization", "Bearer session-token");
            then.status(200).json_body(json!([]));
        })
        .await;

    let idp = IdentityProvider::new("http://auth.invalid", "client-1", "http://localhost/", "http://localhost/");
    let session = Arc::new(Session::new(idp, chrono::Duration::seconds(30)));
    session
        .sign_in(TokenSet::new("session-token", None))
        .await
        .unwrap();

    let client = ApiClient::new(&server.base_url()).with_session(session);
    client
        .get("/configurations", None, RequestOptions::default())
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_signed_out_session_is_auth_error() {
    let idp = IdentityProvider::new("http://auth.invalid", "client-1", "http://localhost/", "http://localhost/");
    let session = Arc::new(Session::new(idp, chrono::Duration::seconds(30)));
    let client = ApiClient::new("http://api.invalid").with_session(session);

    let err = client.get("/prompts", None, RequestOptions::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));
    assert!(err.is_auth());
}
