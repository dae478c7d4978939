//! HTTP surface tests: handshake authentication and health endpoints.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use tower::ServiceExt;

use campushub_api::{AppState, build_router};
use campushub_auth::jwt::decoder::TokenDecoder;
use campushub_auth::jwt::encoder::TokenEncoder;
use campushub_auth::verifier::JwtIdentityVerifier;
use campushub_core::config::AppConfig;
use campushub_core::types::id::PrincipalId;
use campushub_directory::{DirectoryStore, InMemoryDirectory};
use campushub_entity::{Principal, Role};
use campushub_realtime::RealtimeEngine;

/// Test application context.
struct TestApp {
    router: Router,
    encoder: TokenEncoder,
    directory: Arc<InMemoryDirectory>,
}

impl TestApp {
    fn new() -> Self {
        let config = AppConfig::default();
        let directory = Arc::new(InMemoryDirectory::new());
        let engine = Arc::new(RealtimeEngine::new(
            config.realtime.clone(),
            directory.clone() as Arc<dyn DirectoryStore>,
        ));
        let verifier = Arc::new(JwtIdentityVerifier::new(
            TokenDecoder::new(&config.auth),
            directory.clone() as Arc<dyn DirectoryStore>,
        ));
        let encoder = TokenEncoder::new(&config.auth);
        let state = AppState::new(Arc::new(config), engine, verifier);

        Self {
            router: build_router(state),
            encoder,
            directory,
        }
    }

    fn seed_principal(&self, active: bool) -> PrincipalId {
        let id = PrincipalId::new();
        self.directory.upsert_principal(Principal {
            id,
            display_name: "Sam".to_string(),
            role: Role::Student,
            department: "cs".to_string(),
            courses: Default::default(),
            active,
        });
        id
    }

    async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    async fn ws_upgrade(&self, uri: &str) -> StatusCode {
        let request = Request::builder()
            .uri(uri)
            .header("host", "localhost")
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap().status()
    }
}

#[tokio::test]
async fn test_ws_upgrade_without_token_rejected() {
    let app = TestApp::new();
    let status = app.ws_upgrade("/ws").await;
    assert!(status.is_client_error(), "expected 4xx, got {status}");
}

#[tokio::test]
async fn test_ws_upgrade_with_invalid_token_unauthorized() {
    let app = TestApp::new();
    let status = app.ws_upgrade("/ws?token=garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_upgrade_inactive_principal_unauthorized() {
    let app = TestApp::new();
    let id = app.seed_principal(false);
    let token = app.encoder.issue(id).unwrap();
    let status = app.ws_upgrade(&format!("/ws?token={token}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_upgrade_with_valid_token_switches_protocols() {
    let app = TestApp::new();
    let id = app.seed_principal(true);
    let token = app.encoder.issue(id).unwrap();
    let status = app.ws_upgrade(&format!("/ws?token={token}")).await;
    assert_eq!(status, StatusCode::SWITCHING_PROTOCOLS);
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("status").unwrap().as_str().unwrap(), "ok");
}

#[tokio::test]
async fn test_detailed_health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health/detailed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("connections").unwrap().as_u64().unwrap(), 0);
    assert!(body.get("metrics").is_some());
}
