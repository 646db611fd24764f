use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{mailer::Mailer, security::TokenKeys, storage::ImageStore};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub tokens: TokenKeys,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageStore>,
    /// Base of the reset link sent by forgot-password.
    pub frontend_url: String,
}
