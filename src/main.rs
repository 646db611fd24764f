use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use menu_admin_api::{
    app::build_app,
    config::{AppConfig, StorageConfig},
    db::{create_orm_conn, run_migrations},
    mailer::{LogMailer, Mailer, SendGridMailer},
    security::TokenKeys,
    state::AppState,
    storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,menu_admin_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let mailer: Arc<dyn Mailer> = match &config.email.sendgrid_api_key {
        Some(key) => Arc::new(SendGridMailer::new(key.clone(), config.email.from.clone())),
        None => {
            tracing::warn!("SENDGRID_API_KEY not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };
    let images = storage::from_config(&config.storage).await?;
    let uploads_dir = match &config.storage {
        StorageConfig::Local { dir, .. } => Some(dir.as_str()),
        StorageConfig::S3 { .. } => None,
    };

    let state = AppState {
        orm,
        tokens: TokenKeys::new(&config.jwt),
        mailer,
        images,
        frontend_url: config.frontend_url.clone(),
    };
    let app = build_app(state, uploads_dir);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
