pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::OtpVaultConfig;
use crate::db::CredentialStore;
use crate::services::{AuthService, AuthenticatorService, SecretVault, TokenService, TotpEngine};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::verify_otp,
        handlers::totp::list_services,
        handlers::totp::add_service,
        handlers::totp::parse_uri,
        handlers::totp::remove_service,
        handlers::totp::service_code,
        handlers::totp::disable,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::VerifyOtpRequest,
            dtos::auth::VerifyOtpResponse,
            dtos::totp::ImportAuthenticatorRequest,
            dtos::totp::ImportAuthenticatorResponse,
            dtos::totp::AuthenticatorCodeView,
            dtos::totp::ListAuthenticatorsResponse,
            dtos::totp::CodeResponse,
            dtos::totp::DisableRequest,
            dtos::totp::ParseUriRequest,
            dtos::totp::ParseUriResponse,
            models::UserView,
            models::AuthenticatorView,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and OTP verification"),
        (name = "TOTP", description = "Authenticator vault and code generation"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: OtpVaultConfig,
    pub store: Arc<dyn CredentialStore>,
    pub tokens: TokenService,
    pub auth_service: AuthService,
    pub authenticator_service: AuthenticatorService,
}

impl AppState {
    pub fn new(config: OtpVaultConfig, store: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.token);
        let vault = SecretVault::new(&config.vault)?;
        let totp = TotpEngine::default();

        let auth_service =
            AuthService::new(store.clone(), tokens.clone(), vault.clone(), totp.clone());
        let authenticator_service =
            AuthenticatorService::new(store.clone(), vault, totp);

        Ok(Self {
            config,
            store,
            tokens,
            auth_service,
            authenticator_service,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    // Everything under /totp requires a full token; verify-otp is the one
    // route a temporary token can reach.
    let totp_routes = Router::new()
        .route(
            "/totp/services",
            get(handlers::totp::list_services).post(handlers::totp::add_service),
        )
        .route("/totp/services/parse", post(handlers::totp::parse_uri))
        .route("/totp/services/:id", delete(handlers::totp::remove_service))
        .route("/totp/services/:id/otp", get(handlers::totp::service_code))
        .route("/totp/disable", post(handlers::totp::disable))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let verify_otp_route = Router::new()
        .route("/auth/verify-otp", post(handlers::auth::verify_otp))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::temp_auth_middleware,
        ));

    let cors_origins = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!(origin = %o, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    Router::new()
        .route("/health", get(health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .merge(verify_otp_route)
        .merge(totp_routes)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(cors_origins)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "Observability"
)]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
