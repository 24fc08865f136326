use std::{collections::HashMap, net::SocketAddr};

use axum::{Form, Json, Router, routing::post};
use edutools::auth::{AuthError, OAuthClient, RedirectServer, TokenInfo, TokenResponse};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve stub");
    });
    addr
}

fn client(token_url: String, secret: Option<&str>) -> OAuthClient {
    OAuthClient::builder()
        .http(reqwest::Client::new())
        .authorize_url("https://example.com/oauth2/authorize/")
        .token_url(token_url)
        .client_id("edu-client")
        .maybe_client_secret(secret.map(str::to_string))
        .build()
}

#[test]
fn tokens_go_stale_ten_minutes_early() {
    let tokens = TokenInfo {
        access_token:  "access".into(),
        refresh_token: "refresh".into(),
        expires_in:    10_000,
    };

    assert!(tokens.is_up_to_date_at(9_399));
    assert!(!tokens.is_up_to_date_at(9_400));
    assert!(!TokenInfo::default().is_up_to_date_at(0));
}

#[test]
fn token_replies_get_absolute_expiry() {
    let response: TokenResponse =
        serde_json::from_value(json!({"access_token": "a", "expires_in": 3600})).expect("reply");
    let tokens = TokenInfo::from_response(response, 1_000);

    assert_eq!(tokens.expires_in, 4_600);
    assert_eq!(tokens.refresh_token, "");
}

#[test]
fn authorization_url_carries_the_redirect() {
    let oauth = client("https://example.com/oauth2/token/".into(), None);
    let url = oauth
        .authorization_url("http://localhost:63342/api/edu/stepik/oauth")
        .expect("url");

    assert!(url.starts_with("https://example.com/oauth2/authorize/?"));
    assert!(url.contains("client_id=edu-client"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A63342%2Fapi%2Fedu%2Fstepik%2Foauth"));
}

#[test]
fn blank_client_properties_are_refused() {
    let oauth = OAuthClient::builder()
        .http(reqwest::Client::new())
        .authorize_url("https://example.com/")
        .token_url("https://example.com/token")
        .client_id("  ")
        .build();

    assert!(matches!(
        oauth.authorization_url("http://localhost"),
        Err(AuthError::MissingClientProperties)
    ));
    let with_blank_secret = client("https://example.com/token".into(), Some(""));
    assert!(matches!(
        with_blank_secret.require_client_properties(),
        Err(AuthError::MissingClientProperties)
    ));
}

#[tokio::test]
async fn codes_are_exchanged_for_tokens() {
    let router = Router::new().route(
        "/token",
        post(|Form(form): Form<HashMap<String, String>>| async move {
            assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
            assert_eq!(form.get("client_secret").map(String::as_str), Some("s3cret"));
            Json(json!({
                "access_token": format!("token-for-{}", form["code"]),
                "refresh_token": "refresh",
                "expires_in": 36000
            }))
        }),
    );
    let addr = serve(router).await;
    let oauth = client(format!("http://{addr}/token"), Some("s3cret"));

    let tokens = oauth
        .exchange_code("abc", "http://localhost:63342/cb")
        .await
        .expect("tokens");

    assert_eq!(tokens.access_token, "token-for-abc");
    assert_eq!(tokens.refresh_token, "refresh");
    assert!(tokens.is_up_to_date());
}

#[tokio::test]
async fn rejected_grants_keep_the_status() {
    let router = Router::new().route(
        "/token",
        post(|| async { (axum::http::StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"}))) }),
    );
    let addr = serve(router).await;
    let oauth = client(format!("http://{addr}/token"), None);

    match oauth.refresh("stale").await {
        Err(AuthError::Rejected { status, body }) => {
            assert_eq!(status, 400);
            let body: Value = serde_json::from_str(&body).expect("json body");
            assert_eq!(body["error"], "invalid_grant");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn redirect_server_hands_over_the_code() {
    let server = RedirectServer::start_in(41200..=41220, "/api/edu/stepik/oauth")
        .await
        .expect("start redirect server");
    let uri = server.redirect_uri();
    assert_eq!(uri, format!("http://127.0.0.1:{}/api/edu/stepik/oauth", server.port()));

    let page = reqwest::get(format!("{uri}?code=xyz"))
        .await
        .expect("redirect")
        .text()
        .await
        .expect("page");
    assert!(page.contains("Authorization succeeded"));

    assert_eq!(server.wait_for_code().await.expect("code"), "xyz");
}

#[tokio::test]
async fn redirect_errors_deny_the_login() {
    let server = RedirectServer::start_in(41230..=41250, "/cb")
        .await
        .expect("start redirect server");
    reqwest::get(format!("http://127.0.0.1:{}/cb?error=access_denied", server.port()))
        .await
        .expect("redirect");

    match server.wait_for_code().await {
        Err(AuthError::Denied(reason)) => assert_eq!(reason, "access_denied"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn taken_ports_are_skipped() {
    let blocker = TcpListener::bind("127.0.0.1:0").await.expect("bind blocker");
    let port = blocker.local_addr().expect("address").port();

    let result = RedirectServer::start_in(port..=port, "/cb").await;
    assert!(matches!(result, Err(AuthError::NoPortsAvailable)));
}
