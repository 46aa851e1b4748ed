//! Failure injection tests for the relay.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cors_relay::http::HttpServer;
use cors_relay::lifecycle::Shutdown;

mod common;

use common::{
    get_with_target, refused_address, relay, relay_config, start_delayed_upstream,
    start_mock_upstream, start_redirect_upstream, API_KEY,
};

const PROXY_FAILED: &str = r#"{"error":"Proxy request failed"}"#;
const BODY_TOO_LARGE: &str = r#"{"error":"Request body too large"}"#;

#[tokio::test]
async fn connection_refused_is_a_generic_failure() {
    let addr = refused_address().await;
    let config = relay_config(Some(API_KEY), &["127.0.0.1"]);

    let (status, _, body) = relay(config, get_with_target(&format!("http://{addr}/"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, PROXY_FAILED);
}

#[tokio::test]
async fn unresolvable_host_is_a_generic_failure() {
    let config = relay_config(Some(API_KEY), &["no-such-host.invalid"]);

    let (status, _, body) =
        relay(config, get_with_target("http://no-such-host.invalid/")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, PROXY_FAILED);
}

#[tokio::test]
async fn falsely_labeled_json_is_a_generic_failure() {
    let upstream = start_mock_upstream(200, Some("application/json"), "<html>oops</html>").await;
    let config = relay_config(Some(API_KEY), &["127.0.0.1"]);

    let (status, _, body) = relay(config, get_with_target(&upstream.url("/"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, PROXY_FAILED);
    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn unsupported_scheme_is_a_generic_failure() {
    let config = relay_config(Some(API_KEY), &["127.0.0.1"]);

    let (status, _, body) = relay(config, get_with_target("ftp://127.0.0.1/file")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, PROXY_FAILED);
}

#[tokio::test]
async fn configured_upstream_timeout_is_enforced() {
    let upstream = start_delayed_upstream(200, Some("text/plain"), "late", Duration::from_secs(3)).await;
    let mut config = relay_config(Some(API_KEY), &["127.0.0.1"]);
    config.upstream.timeout_secs = Some(1);

    let (status, _, body) = relay(config, get_with_target(&upstream.url("/"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, PROXY_FAILED);
}

#[tokio::test]
async fn oversized_body_is_rejected_before_forwarding() {
    let upstream = start_mock_upstream(200, Some("text/plain"), "ok").await;
    let mut config = relay_config(Some(API_KEY), &["127.0.0.1"]);
    config.limits.max_body_size = 64;

    let payload = serde_json::json!({
        "url": upstream.url("/"),
        "body": "x".repeat(1024),
    })
    .to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("x-api-key", API_KEY)
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .unwrap();

    let (status, headers, body) = relay(config, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(body, BODY_TOO_LARGE);
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn oversized_body_without_length_is_rejected() {
    let upstream = start_mock_upstream(200, Some("text/plain"), "ok").await;
    let mut config = relay_config(Some(API_KEY), &["127.0.0.1"]);
    config.limits.max_body_size = 64;

    let payload = serde_json::json!({
        "url": upstream.url("/"),
        "body": "x".repeat(1024),
    })
    .to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("x-api-key", API_KEY)
        .body(Body::from(payload))
        .unwrap();

    let (status, _, body) = relay(config, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, BODY_TOO_LARGE);
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn request_deadline_is_a_generic_failure() {
    let upstream = start_delayed_upstream(200, Some("text/plain"), "late", Duration::from_secs(3)).await;
    let mut config = relay_config(Some(API_KEY), &["127.0.0.1"]);
    config.limits.request_timeout_secs = Some(1);

    let (status, headers, body) = relay(config, get_with_target(&upstream.url("/"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(body, PROXY_FAILED);
}

#[tokio::test]
async fn redirect_off_the_whitelist_is_not_followed() {
    let target = start_mock_upstream(200, Some("text/plain"), "internal").await;
    let redirector =
        start_redirect_upstream(format!("http://localhost:{}/admin", target.addr.port())).await;
    let config = relay_config(Some(API_KEY), &["127.0.0.1"]);

    let (status, _, body) = relay(config, get_with_target(&redirector.url("/"))).await;

    assert_eq!(status, StatusCode::OK);
    let envelope: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope, serde_json::json!({"status": 302, "data": "moved"}));
    assert_eq!(redirector.hits(), 1);
    assert_eq!(target.hits(), 0);
}

#[tokio::test]
async fn redirect_within_the_whitelist_is_followed() {
    let target = start_mock_upstream(200, Some("application/json"), r#"{"landed":true}"#).await;
    let redirector = start_redirect_upstream(target.url("/landing")).await;
    let config = relay_config(Some(API_KEY), &["127.0.0.1"]);

    let (status, _, body) = relay(config, get_with_target(&redirector.url("/"))).await;

    assert_eq!(status, StatusCode::OK);
    let envelope: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope, serde_json::json!({"status": 200, "data": {"landed": true}}));
    assert_eq!(target.last().path_and_query, "/landing");
}

#[tokio::test]
async fn served_over_tcp_and_shuts_down() {
    let upstream = start_mock_upstream(200, Some("application/json"), r#"{"ok":true}"#).await;
    let config = relay_config(Some(API_KEY), &["127.0.0.1"]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .post(format!("http://{proxy_addr}/"))
        .header("x-api-key", API_KEY)
        .header("x-target-accept", "application/json")
        .json(&serde_json::json!({ "url": upstream.url("/status") }))
        .send()
        .await
        .expect("relay unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope, serde_json::json!({"status": 200, "data": {"ok": true}}));
    assert_eq!(upstream.last().headers.get("accept").unwrap(), "application/json");

    assert!(shutdown.trigger());
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
