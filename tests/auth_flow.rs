mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;

use common::{
    PASSWORD, get_request, json_request, reload_user, setup, setup_with, FailingMailer,
};
use menu_admin_api::{
    dto::auth::{ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest},
    entity::{Users, users},
    error::AppError,
    models::Role,
    security::{TokenKind, digest_reset_token},
    services::auth_service,
};

fn login_payload(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.into(),
        password: password.into(),
    }
}

/// Pulls the plain token out of the reset link in the captured email.
fn token_from_email(html: &str) -> String {
    let start = html.find("token=").unwrap() + "token=".len();
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}

#[tokio::test]
async fn login_issues_tokens_and_stores_refresh_token() {
    let app = setup().await;
    let user = app.user("chef@example.com", Role::Admin).await;

    let pair = auth_service::login(&app.state, login_payload("  Chef@Example.com ", PASSWORD))
        .await
        .unwrap();

    let claims = app
        .state
        .tokens
        .verify(&pair.access_token, TokenKind::Access)
        .unwrap();
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.email, "chef@example.com");

    let stored = reload_user(&app.state.orm, user.id).await;
    assert_eq!(stored.refresh_token.as_deref(), Some(pair.refresh_token.as_str()));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_identically() {
    let app = setup().await;
    app.user("chef@example.com", Role::Admin).await;

    let first = app
        .request(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "chef@example.com", "password": "WrongPass1" }),
        ))
        .await;
    let second = app
        .request(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "chef@example.com", "password": "WrongPass2" }),
        ))
        .await;
    let unknown = app
        .request(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ghost@example.com", "password": "WrongPass1" }),
        ))
        .await;

    for (status, _, body) in [&first, &second, &unknown] {
        assert_eq!(*status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }
    assert_eq!(first.2, second.2);
}

#[tokio::test]
async fn login_validates_payload() {
    let app = setup().await;
    let (status, _, body) = app
        .request(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "not-an-email", "password": "123" }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = setup().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, _, body) = app.request(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn refresh_rotates_and_invalidates_previous_token() {
    let app = setup().await;
    app.user("chef@example.com", Role::Admin).await;
    let first = auth_service::login(&app.state, login_payload("chef@example.com", PASSWORD))
        .await
        .unwrap();

    let second = auth_service::refresh_tokens(
        &app.state,
        RefreshRequest {
            refresh_token: first.refresh_token.clone(),
        },
    )
    .await
    .unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);

    let replay = auth_service::refresh_tokens(
        &app.state,
        RefreshRequest {
            refresh_token: first.refresh_token,
        },
    )
    .await;
    assert!(matches!(replay, Err(AppError::InvalidRefreshToken)));
}

#[tokio::test]
async fn access_token_cannot_be_used_to_refresh() {
    let app = setup().await;
    app.user("chef@example.com", Role::Admin).await;
    let pair = auth_service::login(&app.state, login_payload("chef@example.com", PASSWORD))
        .await
        .unwrap();

    let (status, _, body) = app
        .request(json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({ "refresh_token": pair.access_token }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");
}

#[tokio::test]
async fn forgot_password_stores_digest_and_mails_link() {
    let app = setup().await;
    let user = app.user("chef@example.com", Role::Admin).await;

    auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: "CHEF@example.com".into(),
        },
    )
    .await
    .unwrap();

    let messages = app.mailer.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to, "chef@example.com");
    assert!(
        messages[0]
            .html
            .contains("http://frontend.test/auth/reset-password?token=")
    );

    let token = token_from_email(&messages[0].html);
    assert_eq!(token.len(), 40);

    let stored = reload_user(&app.state.orm, user.id).await;
    assert_eq!(
        stored.reset_password_token.as_deref(),
        Some(digest_reset_token(&token).as_str())
    );
    let expire = stored.reset_password_expire.unwrap().with_timezone(&Utc);
    assert!(expire > Utc::now() + Duration::minutes(9));
    assert!(expire <= Utc::now() + Duration::minutes(10));
}

#[tokio::test]
async fn forgot_password_for_unknown_email() {
    let app = setup().await;

    let result = auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: "ghost@example.com".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::UserNotFound)));

    let (status, _, body) = app
        .request(json_request(
            "POST",
            "/api/auth/forgot-password",
            None,
            json!({ "email": "ghost@example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("reset link"));
    assert!(app.mailer.messages().is_empty());
}

#[tokio::test]
async fn failed_delivery_clears_reset_fields() {
    let app = setup_with(Some(Arc::new(FailingMailer))).await;
    let user = app.user("chef@example.com", Role::Admin).await;

    let result = auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: "chef@example.com".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::EmailDelivery(_))));

    let stored = reload_user(&app.state.orm, user.id).await;
    assert!(stored.reset_password_token.is_none());
    assert!(stored.reset_password_expire.is_none());

    let (status, _, _) = app
        .request(json_request(
            "POST",
            "/api/auth/forgot-password",
            None,
            json!({ "email": "chef@example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn reset_password_updates_hash_and_ends_session() {
    let app = setup().await;
    let user = app.user("chef@example.com", Role::Admin).await;
    let before = auth_service::login(&app.state, login_payload("chef@example.com", PASSWORD))
        .await
        .unwrap();
    auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: "chef@example.com".into(),
        },
    )
    .await
    .unwrap();
    let token = token_from_email(&app.mailer.messages()[0].html);

    let (status, _, body) = app
        .request(json_request(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": token.clone(), "password": "NewSecret9" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let stored = reload_user(&app.state.orm, user.id).await;
    assert!(stored.reset_password_token.is_none());
    assert!(stored.reset_password_expire.is_none());
    assert!(stored.refresh_token.is_none());

    let old_refresh = auth_service::refresh_tokens(
        &app.state,
        RefreshRequest {
            refresh_token: before.refresh_token,
        },
    )
    .await;
    assert!(matches!(old_refresh, Err(AppError::InvalidRefreshToken)));

    assert!(
        auth_service::login(&app.state, login_payload("chef@example.com", "NewSecret9"))
            .await
            .is_ok()
    );

    let reuse = auth_service::reset_password(
        &app.state,
        ResetPasswordRequest {
            token,
            password: "Another9x".into(),
        },
    )
    .await;
    assert!(matches!(reuse, Err(AppError::InvalidResetToken)));
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let app = setup().await;
    let user = app.user("chef@example.com", Role::Admin).await;
    auth_service::forgot_password(
        &app.state,
        ForgotPasswordRequest {
            email: "chef@example.com".into(),
        },
    )
    .await
    .unwrap();
    let token = token_from_email(&app.mailer.messages()[0].html);

    let stored = reload_user(&app.state.orm, user.id).await;
    let mut active: users::ActiveModel = stored.into();
    active.reset_password_expire = Set(Some((Utc::now() - Duration::minutes(11)).into()));
    active.update(&app.state.orm).await.unwrap();

    let (status, _, body) = app
        .request(json_request(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": token, "password": "NewSecret9" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn reset_password_requires_strong_password() {
    let app = setup().await;
    let (status, _, body) = app
        .request(json_request(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": "abc", "password": "alllowercase1" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let app = setup().await;

    let (status, _, body) = app.request(get_request("/api/category", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");

    let (status, _, body) = app
        .request(get_request("/api/category", Some("Bearer not.a.jwt")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn expired_access_token_is_flagged() {
    let app = setup().await;
    let user = app.user("chef@example.com", Role::Admin).await;
    let token = app
        .state
        .tokens
        .issue(user.id, &user.email, TokenKind::Access, Duration::seconds(-30))
        .unwrap();

    let (status, _, body) = app
        .request(get_request("/api/category", Some(&format!("Bearer {token}"))))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");
    assert_eq!(body["expired"], true);
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = setup().await;
    let user = app.user("chef@example.com", Role::Admin).await;
    let token = app
        .state
        .tokens
        .issue(user.id, &user.email, TokenKind::Refresh, Duration::minutes(5))
        .unwrap();

    let (status, _, body) = app
        .request(get_request("/api/category", Some(&format!("Bearer {token}"))))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn deleted_user_token_is_rejected() {
    let app = setup().await;
    let user = app.user("chef@example.com", Role::Admin).await;
    let bearer = app.bearer(&user);
    Users::delete_by_id(user.id)
        .exec(&app.state.orm)
        .await
        .unwrap();

    let (status, _, body) = app.request(get_request("/api/category", Some(&bearer))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found");
}
