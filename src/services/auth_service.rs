use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    dto::auth::{ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest},
    entity::{
        Users,
        users::{ActiveModel, Column, Model as UserModel},
    },
    error::{AppError, AppResult},
    mailer::password_reset_email,
    security::{
        RESET_TOKEN_TTL_MINUTES, TokenKind, TokenPair, digest_reset_token, generate_reset_token,
        hash_password, verify_password,
    },
    state::AppState,
};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_by_email(state: &AppState, email: &str) -> AppResult<Option<UserModel>> {
    Ok(Users::find()
        .filter(Column::Email.eq(normalize_email(email)))
        .one(&state.orm)
        .await?)
}

/// Issues a fresh pair and stores the refresh half on the user, replacing any previous one.
async fn rotate_tokens(state: &AppState, user: UserModel) -> AppResult<TokenPair> {
    let pair = state.tokens.issue_pair(user.id, &user.email)?;

    let mut active: ActiveModel = user.into();
    active.refresh_token = Set(Some(pair.refresh_token.clone()));
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    Ok(pair)
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<TokenPair> {
    let user = find_by_email(state, &payload.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let user_id = user.id;
    let pair = rotate_tokens(state, user).await?;
    tracing::info!(user_id = %user_id, "user logged in");
    Ok(pair)
}

pub async fn refresh_tokens(state: &AppState, payload: RefreshRequest) -> AppResult<TokenPair> {
    let claims = state
        .tokens
        .verify(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|_| AppError::InvalidRefreshToken)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidRefreshToken)?;

    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::InvalidRefreshToken)?;
    if user.refresh_token.as_deref() != Some(payload.refresh_token.as_str()) {
        return Err(AppError::InvalidRefreshToken);
    }

    rotate_tokens(state, user).await
}

/// Stores a reset digest and mails the plain token; rolls the digest back if sending fails.
pub async fn forgot_password(state: &AppState, payload: ForgotPasswordRequest) -> AppResult<()> {
    let user = find_by_email(state, &payload.email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let (token, digest) = generate_reset_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    let name = user.name.clone();
    let email = user.email.clone();
    let mut active: ActiveModel = user.into();
    active.reset_password_token = Set(Some(digest));
    active.reset_password_expire = Set(Some(expires_at.into()));
    let user = active.update(&state.orm).await?;

    let reset_url = format!(
        "{}/auth/reset-password?token={token}",
        state.frontend_url.trim_end_matches('/')
    );
    let message = password_reset_email(&name, &email, &reset_url);

    if let Err(err) = state.mailer.send(message).await {
        let mut active: ActiveModel = user.into();
        active.reset_password_token = Set(None);
        active.reset_password_expire = Set(None);
        active.update(&state.orm).await?;
        return Err(AppError::EmailDelivery(err));
    }

    tracing::info!(email = %email, "password reset email sent");
    Ok(())
}

pub async fn reset_password(state: &AppState, payload: ResetPasswordRequest) -> AppResult<()> {
    let digest = digest_reset_token(payload.token.trim());
    let user = Users::find()
        .filter(Column::ResetPasswordToken.eq(digest))
        .one(&state.orm)
        .await?
        .ok_or(AppError::InvalidResetToken)?;

    let still_valid = user
        .reset_password_expire
        .is_some_and(|expire| expire.with_timezone(&Utc) > Utc::now());
    if !still_valid {
        return Err(AppError::InvalidResetToken);
    }

    let password_hash = hash_password(&payload.password)?;
    let user_id = user.id;
    let mut active: ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.reset_password_token = Set(None);
    active.reset_password_expire = Set(None);
    active.refresh_token = Set(None);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    tracing::info!(user_id = %user_id, "password reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}
