use std::io::Cursor;

use jobwatch_core::{AuthError, AuthFlow, JobsClient, OAuthConfig};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> OAuthConfig {
    OAuthConfig {
        client_id: "client".into(),
        client_secret: Some("secret".into()),
        auth_url: format!("{}/authorize", server.uri()),
        token_url: format!("{}/token", server.uri()),
        redirect_url: "http://localhost/complete".into(),
        scopes: Vec::new(),
    }
}

#[tokio::test]
async fn verifier_is_exchanged_for_an_access_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=verifier-42"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let flow = AuthFlow::new(&config(&server)).unwrap();
    let pending = flow.begin();
    assert!(pending.url.as_str().starts_with(&format!("{}/authorize", server.uri())));

    let access = flow.complete(pending, "verifier-42\n").await.unwrap();
    assert_eq!(access.access_token, "access-1");
    assert_eq!(access.refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn prompt_prints_the_url_and_reads_the_verifier_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=typed-in"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let flow = AuthFlow::new(&config(&server)).unwrap();
    let mut input = Cursor::new(b"typed-in\n".to_vec());
    let mut output = Vec::new();
    let access = flow.prompt(&mut input, &mut output).await.unwrap();

    assert_eq!(access.access_token, "access-2");
    let shown = String::from_utf8(output).unwrap();
    assert!(shown.starts_with(&format!("Please, visit an url {}/authorize", server.uri())));
    assert!(shown.ends_with(" and enter a verifier: "));
}

#[tokio::test]
async fn unreadable_terminal_input_is_an_io_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let flow = AuthFlow::new(&config(&server)).unwrap();
    let mut input = Cursor::new(vec![0xff, 0xfe, b'\n']);
    let err = flow.prompt(&mut input, &mut Vec::new()).await.unwrap_err();
    assert!(matches!(err, AuthError::Io(_)), "got {err:?}");
}

#[tokio::test]
async fn rejected_verifier_is_an_exchange_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "verifier expired"
        })))
        .mount(&server)
        .await;

    let flow = AuthFlow::new(&config(&server)).unwrap();
    let pending = flow.begin();
    let err = flow.complete(pending, "stale").await.unwrap_err();
    assert!(matches!(err, AuthError::Exchange(_)), "got {err:?}");
}

#[tokio::test]
async fn profile_lookup_returns_the_first_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/v1/info.json"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "server_time": 1413800000,
            "auth_user": { "first_name": "Ada", "last_name": "L", "timezone": "UTC" }
        })))
        .mount(&server)
        .await;

    let api = JobsClient::with_client(Client::new(), &server.uri()).unwrap();
    let info = api
        .user_info(&jobwatch_core::AccessCredential {
            access_token: "access-1".into(),
            refresh_token: None,
        })
        .await
        .unwrap();
    assert_eq!(info.auth_user.first_name, "Ada");
    assert_eq!(info.auth_user.last_name.as_deref(), Some("L"));
}
