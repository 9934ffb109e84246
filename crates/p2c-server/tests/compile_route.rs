//! Integration tests for the HTTP front-end.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`;
//! the external compiler is a shell script, so these only run on unix.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use p2c_core::{GatewayConfig, ProcessBridge};
use p2c_server::{AppState, create_router};
use tempfile::TempDir;
use tower::ServiceExt;

const ORIGIN: &str = "http://localhost:3000";

// =============================================================================
// Test Helpers
// =============================================================================

/// Router wired to a fake compiler script.
struct TestGateway {
    _temp_dir: TempDir,
    router: Router,
}

impl TestGateway {
    fn new(script_body: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let script = temp_dir.path().join("compiler.sh");
        fs::write(&script, format!("#!/bin/sh\n{}\n", script_body))
            .expect("Failed to write script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .expect("Failed to mark script executable");

        let config = GatewayConfig {
            compiler: script.display().to_string(),
            ..GatewayConfig::default()
        };
        let state = Arc::new(AppState {
            bridge: ProcessBridge::new(&config),
        });
        let router = create_router(state, ORIGIN).expect("Failed to build router");

        Self {
            _temp_dir: temp_dir,
            router,
        }
    }

    /// Compiler that succeeds with a fixed C program.
    fn succeeding() -> Self {
        Self::new("cat >/dev/null\nprintf '%s' 'int main(){return 0;}'")
    }

    /// Compiler that fails with a fixed diagnostic.
    fn failing() -> Self {
        Self::new("cat >/dev/null\nprintf '%s' 'syntax error at line 1' >&2\nexit 1")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn post_compile(&self, body: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri("/compile")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ORIGIN, ORIGIN)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

// =============================================================================
// POST /compile
// =============================================================================

#[tokio::test]
async fn test_compile_success() {
    let gateway = TestGateway::succeeding();

    let (status, headers, body) = gateway
        .post_compile(r#"{"code":"begin end.","mode":2}"#)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"result":"int main(){return 0;}"}"#);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
}

#[tokio::test]
async fn test_compile_failure_is_unprocessable() {
    let gateway = TestGateway::failing();

    let (status, _, body) = gateway.post_compile(r#"{"code":"begin","mode":1}"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"message":"syntax error at line 1"}"#);
}

#[tokio::test]
async fn test_request_reaches_compiler_encoded() {
    let gateway = TestGateway::new("cat");

    let (status, _, body) = gateway
        .post_compile(r#"{"code":"program p;\nbegin end.","mode":0}"#)
        .await;

    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["result"], "0 0\nprogram p;\nbegin end.");
}

#[tokio::test]
async fn test_null_fields_compile_as_defaults() {
    let gateway = TestGateway::new("cat");

    let (status, _, body) = gateway.post_compile(r#"{"code":null,"mode":null}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"result":"0 0\n"}"#);
}

#[tokio::test]
async fn test_non_utf8_output_is_replaced_in_json() {
    let gateway = TestGateway::new("cat >/dev/null\nprintf 'a\\377b'");

    let (status, _, body) = gateway.post_compile(r#"{"code":"x","mode":2}"#).await;

    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["result"], "a\u{fffd}b");
}

#[tokio::test]
async fn test_missing_compiler_is_unprocessable() {
    let temp = TempDir::new().unwrap();
    let config = GatewayConfig {
        compiler: temp.path().join("absent").display().to_string(),
        ..GatewayConfig::default()
    };
    let state = Arc::new(AppState {
        bridge: ProcessBridge::new(&config),
    });
    let router = create_router(state, ORIGIN).unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/compile")
                .body(Body::from(r#"{"code":"x","mode":2}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(!body["message"].as_str().unwrap().is_empty());
}

// =============================================================================
// Client errors
// =============================================================================

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let gateway = TestGateway::succeeding();

    let (status, _, body) = gateway.post_compile(r#"{"code":"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Bad request:"));
}

#[tokio::test]
async fn test_unknown_mode_is_bad_request() {
    let gateway = TestGateway::succeeding();

    let (status, _, _) = gateway.post_compile(r#"{"code":"x","mode":5}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_without_content_type_is_accepted() {
    let gateway = TestGateway::succeeding();

    let (status, _, _) = gateway
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/compile")
                .body(Body::from(r#"{"code":"begin end.","mode":2}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_method_is_not_allowed() {
    let gateway = TestGateway::succeeding();

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let (status, _, _) = gateway
            .send(
                Request::builder()
                    .method(method.clone())
                    .uri("/compile")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {}", method);
    }
}

// =============================================================================
// CORS and health
// =============================================================================

#[tokio::test]
async fn test_preflight_answered_without_compiling() {
    // A compiler that would fail loudly if it were ever run.
    let gateway = TestGateway::new("echo 'compiler must not run' >&2\nexit 99");

    for uri in ["/compile", "/anything/else"] {
        let (status, headers, body) = gateway
            .send(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(uri)
                    .header(header::ORIGIN, ORIGIN)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "uri {}", uri);
        assert!(body.is_empty());
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("POST"));
        assert!(methods.contains("OPTIONS"));
    }
}

#[tokio::test]
async fn test_health() {
    let gateway = TestGateway::succeeding();

    let (status, _, body) = gateway
        .send(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "ok");
}
