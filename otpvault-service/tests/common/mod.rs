//! Shared setup for HTTP integration tests: an in-memory store behind the
//! real router, plus helpers for speaking JSON to it.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::util::ServiceExt;

use otpvault_service::{
    build_router,
    config::{Environment, OtpVaultConfig, SecurityConfig, TokenConfig, VaultConfig},
    db::MemoryStore,
    services::TotpEngine,
    AppState,
};

pub const TEST_SECRET: &str = "JBSWY3DPEHPK3PXP";

pub fn test_config() -> OtpVaultConfig {
    OtpVaultConfig {
        environment: Environment::Dev,
        service_name: "otpvault-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        port: 0,
        token: TokenConfig {
            secret: "integration-test-signing-secret".to_string(),
            temp_token_expiry_minutes: 5,
            full_token_expiry_days: 7,
        },
        vault: VaultConfig {
            encryption_key:
                "202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state =
            AppState::new(test_config(), store).expect("Failed to build test state");
        let router = build_router(state.clone());
        Self { router, state }
    }

    pub async fn post_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("DELETE").uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    /// Register a user and log in, returning the login token.
    pub async fn register_and_login(&self, email: &str, password: &str) -> String {
        let (status, _) = self
            .post_json(
                "/auth/register",
                None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .post_json(
                "/auth/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}

/// Code valid right now for a raw base32 secret, computed the same way the
/// service does.
pub fn current_code(secret: &str) -> String {
    TotpEngine::default()
        .generate(secret)
        .expect("Failed to compute code")
}
