use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub frontend_url: String,
    pub email: EmailConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// When unset, outgoing mail is only logged.
    pub sendgrid_api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    S3 {
        bucket: String,
        region: String,
        public_base_url: Option<String>,
    },
    Local {
        dir: String,
        public_base_url: String,
    },
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            access_ttl_secs: parse_or("JWT_ACCESS_TTL_SECS", 3600),
            refresh_ttl_secs: parse_or("JWT_REFRESH_TTL_SECS", 7 * 24 * 3600),
        };

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let email = EmailConfig {
            sendgrid_api_key: env::var("SENDGRID_API_KEY").ok().filter(|k| !k.is_empty()),
            from: env::var("EMAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string()),
        };

        let storage = match env::var("AWS_S3_BUCKET_NAME").ok().filter(|b| !b.is_empty()) {
            Some(bucket) => StorageConfig::S3 {
                bucket,
                region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                public_base_url: env::var("S3_PUBLIC_BASE_URL").ok(),
            },
            None => StorageConfig::Local {
                dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| format!("http://{host}:{port}")),
            },
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            frontend_url,
            email,
            storage,
        })
    }
}

fn parse_or(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
