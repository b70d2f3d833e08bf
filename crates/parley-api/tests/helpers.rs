//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, Request, StatusCode};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use parley_api::{AppState, build_app};
use parley_core::config::AppConfig;
use parley_service::MemoryStore;
use parley_storage::StorageManager;
use parley_storage::providers::LocalObjectStore;

pub const PASSWORD: &str = "Str0ng!Pass";
pub const BOUNDARY: &str = "parley-test-boundary";

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Test application backed by the in-memory store.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching into the realtime engine
    pub state: AppState,
    /// Upload directory, removed on drop
    pub uploads: tempfile::TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when the body is not JSON
    pub body: Value,
    /// Raw body bytes
    pub raw: Vec<u8>,
}

impl TestResponse {
    /// The `Set-Cookie` header, if any.
    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Session token carried in `Set-Cookie`.
    pub fn session_token(&self) -> Option<String> {
        let cookie = self.set_cookie()?;
        let value = cookie.strip_prefix("jwt=")?.split(';').next()?;
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// A registered user and their session token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub token: String,
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let uploads = tempfile::tempdir().expect("Failed to create upload dir");

        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret".into();
        config.storage.local.root_path = uploads.path().to_string_lossy().into_owned();
        config.storage.local.public_base_url = "/uploads".into();

        let local = LocalObjectStore::new(
            &config.storage.local.root_path,
            &config.storage.local.public_base_url,
        )
        .await
        .expect("Failed to init storage");
        let storage = Arc::new(StorageManager::new(
            Arc::new(local),
            config.storage.max_image_size_bytes,
        ));

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone(), store, storage);
        state.realtime.start().await;

        Self {
            router: build_app(state.clone()),
            state,
            uploads,
        }
    }

    /// Send a JSON request, optionally authenticated with a bearer token.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body = body
            .map(|b| serde_json::to_vec(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        self.request_raw(method, path, "application/json", body, token)
            .await
    }

    /// Send a request with an arbitrary body and content type.
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        content_type: &str,
        body: Vec<u8>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type);

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req.body(Body::from(body)).expect("Failed to build request");
        self.send(req).await
    }

    /// Send a prepared request through the router.
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let raw = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body")
            .to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }

    /// Register a user and return their id and session token.
    pub async fn sign_up(&self, full_name: &str, email: &str) -> TestUser {
        let response = self
            .request(
                "POST",
                "/api/auth/signup",
                Some(json!({
                    "fullName": full_name,
                    "email": email,
                    "password": PASSWORD,
                    "confirmPassword": PASSWORD,
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

        TestUser {
            id: response.body["data"]["id"]
                .as_str()
                .expect("user id")
                .to_string(),
            token: response.session_token().expect("session cookie"),
        }
    }

    /// Serve the app on an ephemeral port for WebSocket clients.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("server");
        });
        addr
    }
}

/// Multipart body with the given text fields and files `(field, file name, content type, bytes)`.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Content type matching [`multipart_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Next JSON event from the socket, failing after two seconds.
pub async fn next_event(ws: &mut WsClient) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(msg)) if msg.is_text() => return msg,
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for an event");

    serde_json::from_str(frame.to_text().expect("text frame")).expect("JSON event")
}

/// Read events until a `getOnlineUsers` snapshot equal to `expected` arrives.
pub async fn wait_for_online(ws: &mut WsClient, expected: &[&str]) {
    let expected: HashSet<String> = expected.iter().map(|s| s.to_string()).collect();
    loop {
        let event = next_event(ws).await;
        if event["event"] == "getOnlineUsers" {
            let online: HashSet<String> = event["data"]
                .as_array()
                .expect("snapshot array")
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            if online == expected {
                return;
            }
        }
    }
}

/// Read events until a `newMessage` arrives and return its payload.
pub async fn wait_for_message(ws: &mut WsClient) -> Value {
    loop {
        let event = next_event(ws).await;
        if event["event"] == "newMessage" {
            return event["data"].clone();
        }
    }
}
