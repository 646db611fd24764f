use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::auth::{
        ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest, TokenResponse,
    },
    error::{AppResult, ErrorBody},
    extract::AppJson,
    response::MessageResponse,
    services::auth_service,
    state::AppState,
};

const RESET_LINK_SENT: &str =
    "If an account with that email exists, a password reset link has been sent";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    payload.validate()?;
    let pair = auth_service::login(&state, payload).await?;
    Ok(Json(pair.into()))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated token pair", body = TokenResponse),
        (status = 401, description = "Invalid refresh token", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    payload.validate()?;
    let pair = auth_service::refresh_tokens(&state, payload).await?;
    Ok(Json(pair.into()))
}

/// Answers the same way whether or not the email is known.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent when the account exists", body = MessageResponse),
        (status = 400, description = "Validation failed", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    payload.validate()?;
    if let Err(err) = auth_service::forgot_password(&state, payload).await {
        tracing::warn!(error = %err, "forgot-password did not send a reset link");
    }
    Ok(Json(MessageResponse::new(RESET_LINK_SENT)))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    payload.validate()?;
    auth_service::reset_password(&state, payload).await?;
    Ok(Json(MessageResponse::new("Password reset successful")))
}
