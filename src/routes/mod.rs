use axum::Router;

use crate::state::AppState;

pub mod addons;
pub mod auth;
pub mod categories;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod upload;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/category", categories::router())
        .nest("/product", products::router())
        .nest("/addon", addons::router())
        .nest("/upload", upload::router())
}
