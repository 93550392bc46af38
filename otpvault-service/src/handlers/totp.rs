use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    dtos::{
        totp::{DisableRequest, ImportAuthenticatorRequest, ParseUriRequest, ParseUriResponse},
        ErrorResponse, MessageResponse,
    },
    error::AppError,
    middleware::AuthUser,
    utils::{otpauth::parse_otpauth_uri, ValidatedJson},
    AppState,
};

/// List authenticators with their current codes
///
/// Read-only: listing never updates last-used timestamps.
#[utoipa::path(
    get,
    path = "/totp/services",
    responses(
        (status = 200, description = "Authenticators with current codes", body = ListAuthenticatorsResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "TOTP"
)]
pub async fn list_services(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let res = state.authenticator_service.list_with_codes(claims.sub).await?;
    Ok(Json(res))
}

/// Add an authenticator from a shared secret
#[utoipa::path(
    post,
    path = "/totp/services",
    request_body = ImportAuthenticatorRequest,
    responses(
        (status = 201, description = "Authenticator added", body = ImportAuthenticatorResponse),
        (status = 400, description = "Invalid secret", body = ErrorResponse),
        (status = 409, description = "Duplicate authenticator name", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "TOTP"
)]
pub async fn add_service(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<ImportAuthenticatorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.authenticator_service.import(claims.sub, req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Parse an otpauth:// URI into import form fields
#[utoipa::path(
    post,
    path = "/totp/services/parse",
    request_body = ParseUriRequest,
    responses(
        (status = 200, description = "Parsed URI", body = ParseUriResponse),
        (status = 400, description = "Malformed otpauth URI", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "TOTP"
)]
pub async fn parse_uri(
    ValidatedJson(req): ValidatedJson<ParseUriRequest>,
) -> Result<impl IntoResponse, AppError> {
    let parsed = parse_otpauth_uri(&req.uri)?;
    Ok(Json(ParseUriResponse::from(parsed)))
}

/// Remove an authenticator
#[utoipa::path(
    delete,
    path = "/totp/services/{id}",
    params(("id" = Uuid, Path, description = "Authenticator id")),
    responses(
        (status = 200, description = "Authenticator removed", body = MessageResponse),
        (status = 404, description = "Authenticator not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "TOTP"
)]
pub async fn remove_service(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.authenticator_service.remove(claims.sub, id).await?;
    Ok(Json(MessageResponse {
        message: "Authenticator removed successfully".to_string(),
    }))
}

/// Current code for a single authenticator
///
/// Fetching a single code stamps the authenticator's last-used timestamp.
#[utoipa::path(
    get,
    path = "/totp/services/{id}/otp",
    params(("id" = Uuid, Path, description = "Authenticator id")),
    responses(
        (status = 200, description = "Current code", body = CodeResponse),
        (status = 404, description = "Authenticator not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "TOTP"
)]
pub async fn service_code(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.authenticator_service.code_for(claims.sub, id).await?;
    Ok(Json(res))
}

/// Disable two-factor authentication
///
/// Requires a currently valid code from any registered authenticator and
/// removes all of them in one step.
#[utoipa::path(
    post,
    path = "/totp/disable",
    request_body = DisableRequest,
    responses(
        (status = 200, description = "Two-factor authentication disabled", body = MessageResponse),
        (status = 401, description = "Invalid OTP code or 2FA not enabled", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "TOTP"
)]
pub async fn disable(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<DisableRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .authenticator_service
        .disable(claims.sub, &req.otp)
        .await?;
    Ok(Json(MessageResponse {
        message: "Two-factor authentication disabled".to_string(),
    }))
}
