use std::{env, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use menu_admin_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::menu::MenuFile,
    entity::{
        Users,
        users::{ActiveModel, Column},
    },
    error::AppError,
    mailer::LogMailer,
    middleware::auth::AuthUser,
    models::Role,
    security::{TokenKeys, hash_password},
    services::{auth_service::normalize_email, menu_service},
    state::AppState,
    storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let email = normalize_email(
        &env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string()),
    );
    let password = env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD is not set")?;
    let name = env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
    let role = match env::var("SEED_ADMIN_ROLE").as_deref() {
        Ok("admin") => Role::Admin,
        Ok("superadmin") | Err(_) => Role::Superadmin,
        Ok(other) => anyhow::bail!("SEED_ADMIN_ROLE must be admin or superadmin, got {other}"),
    };

    let now = Utc::now();
    let existing = Users::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(&orm)
        .await?;

    let user_id = match existing {
        Some(user) => {
            let id = user.id;
            let mut active: ActiveModel = user.into();
            active.role = Set(role);
            active.updated_at = Set(now.into());
            active.update(&orm).await?;
            id
        }
        None => {
            let password_hash =
                hash_password(&password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
            let user = ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name),
                email: Set(email.clone()),
                password_hash: Set(password_hash),
                role: Set(role),
                reset_password_token: Set(None),
                reset_password_expire: Set(None),
                refresh_token: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&orm)
            .await?;
            user.id
        }
    };

    println!("Ensured user {email} (role={role:?}), id {user_id}");

    // Optional menu import, e.g. SEED_MENU_FILE=menu.json
    if let Ok(path) = env::var("SEED_MENU_FILE") {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {path}"))?;
        let menu: MenuFile =
            serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

        let state = AppState {
            orm,
            tokens: TokenKeys::new(&config.jwt),
            mailer: Arc::new(LogMailer),
            images: storage::from_config(&config.storage).await?,
            frontend_url: config.frontend_url.clone(),
        };
        let importer = AuthUser {
            user_id,
            email,
            role,
        };
        let summary = menu_service::import_menu(&state, &importer, menu)
            .await
            .map_err(|e| match e {
                AppError::Validation(errors) => anyhow::anyhow!("menu import failed: {errors}"),
                other => anyhow::anyhow!("menu import failed: {other}"),
            })?;
        println!(
            "Imported menu from {path}: categories {}/{}, products {}/{}, addons {}/{} (created/skipped)",
            summary.categories.created,
            summary.categories.skipped,
            summary.products.created,
            summary.products.skipped,
            summary.addons.created,
            summary.addons.skipped,
        );
    }

    Ok(())
}
