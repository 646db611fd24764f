#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    EntityTrait, Schema, Set,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use menu_admin_api::{
    app::build_app,
    config::JwtConfig,
    entity::{AddonProducts, Addons, Categories, Products, Users, users},
    mailer::{EmailMessage, Mailer},
    middleware::auth::AuthUser,
    models::Role,
    security::{TokenKind, TokenKeys, hash_password},
    state::AppState,
    storage::ImageStore,
};

pub const PASSWORD: &str = "Password123";
pub const IMAGE_BASE: &str = "https://images.test";

#[derive(Default)]
pub struct CapturingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl CapturingMailer {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: EmailMessage) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unreachable")
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    pub deleted: Mutex<Vec<String>>,
}

impl MemoryImageStore {
    pub fn url_for(key: &str) -> String {
        format!("{IMAGE_BASE}/{key}")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(Self::url_for(key))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(key.to_string());
        match self.objects.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => anyhow::bail!("no such object: {key}"),
        }
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(IMAGE_BASE)?
            .strip_prefix('/')
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub mailer: Arc<CapturingMailer>,
    pub images: Arc<MemoryImageStore>,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_app(self.state.clone(), None)
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, body)
    }

    pub async fn user(&self, email: &str, role: Role) -> users::Model {
        create_user(&self.state.orm, email, PASSWORD, role).await
    }

    pub fn bearer(&self, user: &users::Model) -> String {
        let token = self
            .state
            .tokens
            .issue(user.id, &user.email, TokenKind::Access, Duration::minutes(5))
            .unwrap();
        format!("Bearer {token}")
    }

    /// An admin, its bearer header and the extractor view services expect.
    pub async fn admin(&self) -> (users::Model, String, AuthUser) {
        let user = self.user("admin@example.com", Role::Admin).await;
        let bearer = self.bearer(&user);
        let auth = auth_user(&user);
        (user, bearer, auth)
    }

    pub async fn superadmin(&self) -> (users::Model, String, AuthUser) {
        let user = self.user("root@example.com", Role::Superadmin).await;
        let bearer = self.bearer(&user);
        let auth = auth_user(&user);
        (user, bearer, auth)
    }
}

pub fn auth_user(user: &users::Model) -> AuthUser {
    AuthUser {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

pub async fn setup() -> TestApp {
    setup_with(None).await
}

/// Builds the app around an in-memory SQLite database; `mailer` overrides the capturing one.
pub async fn setup_with(mailer: Option<Arc<dyn Mailer>>) -> TestApp {
    let orm = test_database().await;
    let capturing = Arc::new(CapturingMailer::default());
    let images = Arc::new(MemoryImageStore::default());

    let state = AppState {
        orm,
        tokens: TokenKeys::new(&JwtConfig {
            secret: "integration-test-secret".into(),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 7200,
        }),
        mailer: mailer.unwrap_or_else(|| capturing.clone() as Arc<dyn Mailer>),
        images: images.clone(),
        frontend_url: "http://frontend.test".into(),
    };

    TestApp {
        state,
        mailer: capturing,
        images,
    }
}

pub async fn test_database() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();

    let backend = DbBackend::Sqlite;
    let schema = Schema::new(backend);
    let tables = [
        schema.create_table_from_entity(Users),
        schema.create_table_from_entity(Categories),
        schema.create_table_from_entity(Products),
        schema.create_table_from_entity(Addons),
        schema.create_table_from_entity(AddonProducts),
    ];
    for table in tables {
        db.execute(backend.build(&table)).await.unwrap();
    }

    for table in ["categories", "products", "addons"] {
        db.execute_unprepared(&format!(
            "CREATE UNIQUE INDEX {table}_active_name_key ON {table} (name) WHERE is_active"
        ))
        .await
        .unwrap();
    }

    db
}

pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    role: Role,
) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Test User".into()),
        email: Set(email.to_lowercase()),
        password_hash: Set(hash_password(password).unwrap()),
        role: Set(role),
        reset_password_token: Set(None),
        reset_password_expire: Set(None),
        refresh_token: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn reload_user(db: &DatabaseConnection, id: Uuid) -> users::Model {
    Users::find_by_id(id).one(db).await.unwrap().unwrap()
}

pub fn json_request(method: &str, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    builder.body(Body::empty()).unwrap()
}
