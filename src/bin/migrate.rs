use menu_admin_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
};
use sea_orm::ConnectionTrait;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,menu_admin_api=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    tracing::info!(backend = ?orm.get_database_backend(), "running migrations");
    let applied = run_migrations(&orm).await?;
    println!("Migrations applied: {applied} new");
    Ok(())
}
