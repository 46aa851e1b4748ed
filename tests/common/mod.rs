//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, LOCATION},
        HeaderMap, Request, Response, StatusCode,
    },
    Router,
};
use cors_relay::{HttpServer, RelayConfig};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const API_KEY: &str = "test-secret";

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Captured {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// A running mock upstream that records every request it receives.
#[allow(dead_code)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

#[allow(dead_code)]
impl MockUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.captured.lock().unwrap().len()
    }

    pub fn last(&self) -> Captured {
        self.captured
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("upstream received no request")
    }
}

/// Start a mock upstream answering every request with a fixed response.
#[allow(dead_code)]
pub async fn start_mock_upstream(
    status: u16,
    content_type: Option<&'static str>,
    body: &'static str,
) -> MockUpstream {
    start_delayed_upstream(status, content_type, body, Duration::ZERO).await
}

/// Like `start_mock_upstream`, but waits `delay` before answering.
#[allow(dead_code)]
pub async fn start_delayed_upstream(
    status: u16,
    content_type: Option<&'static str>,
    body: &'static str,
    delay: Duration,
) -> MockUpstream {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let log = captured.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let log = log.clone();
        async move {
            capture(&log, request).await;

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let mut response = Response::builder().status(StatusCode::from_u16(status).unwrap());
            if let Some(content_type) = content_type {
                response = response.header(CONTENT_TYPE, content_type);
            }
            response.body(Body::from(body)).unwrap()
        }
    });

    serve_mock(app, captured).await
}

/// Start a mock upstream that answers every request with a 302 to `location`.
#[allow(dead_code)]
pub async fn start_redirect_upstream(location: String) -> MockUpstream {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let log = captured.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let log = log.clone();
        let location = location.clone();
        async move {
            capture(&log, request).await;
            Response::builder()
                .status(StatusCode::FOUND)
                .header(LOCATION, location)
                .header(CONTENT_TYPE, "text/plain")
                .body(Body::from("moved"))
                .unwrap()
        }
    });

    serve_mock(app, captured).await
}

async fn capture(log: &Mutex<Vec<Captured>>, request: Request<Body>) {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    log.lock().unwrap().push(Captured {
        method: parts.method.to_string(),
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        headers: parts.headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    });
}

async fn serve_mock(app: Router, captured: Arc<Mutex<Vec<Captured>>>) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, captured }
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn refused_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Relay configuration with the test key and the given whitelist.
pub fn relay_config(api_key: Option<&str>, hosts: &[&str]) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.auth.api_key = api_key.map(str::to_string);
    config.targets.allowed_hosts = hosts.iter().map(|h| h.to_string()).collect();
    config.upstream.system_proxy = false;
    config
}

/// Send one request through an in-process relay router.
#[allow(dead_code)]
pub async fn relay(config: RelayConfig, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let app = HttpServer::new(config).unwrap().into_router();
    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

/// GET `/` with the test key and `url` as the query target.
#[allow(dead_code)]
pub fn get_with_target(target: &str) -> Request<Body> {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("url", target)
        .finish();
    Request::builder()
        .uri(format!("/?{}", query))
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}
