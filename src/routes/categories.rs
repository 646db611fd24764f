use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::categories::{CreateCategoryRequest, UpdateCategoryRequest},
    error::{AppResult, ErrorBody},
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::{AuthUser, ensure_superadmin},
    models::Category,
    response::{MessageResponse, Page},
    routes::params::CategoryQuery,
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/{id}/permanent", delete(hard_delete_category))
}

#[utoipa::path(
    get,
    path = "/api/category",
    params(CategoryQuery),
    responses(
        (status = 200, description = "Active categories", body = Page<Category>),
        (status = 400, description = "Invalid query", body = ErrorBody),
        (status = 401, description = "Authentication required", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
    AppQuery(query): AppQuery<CategoryQuery>,
) -> AppResult<Json<Page<Category>>> {
    query.validate()?;
    let page = category_service::list_categories(&state, query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/category/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Category not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Category>> {
    Ok(Json(category_service::get_category(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/category",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation failed or duplicate name", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    payload.validate()?;
    let category = category_service::create_category(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/category/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Validation failed or duplicate name", body = ErrorBody),
        (status = 404, description = "Category not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> AppResult<Json<Category>> {
    payload.validate()?;
    let category = category_service::update_category(&state, &user, id, payload).await?;
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/api/category/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deactivated", body = MessageResponse),
        (status = 404, description = "Category not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    category_service::delete_category(&state, &user, id).await?;
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/category/{id}/permanent",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category removed", body = MessageResponse),
        (status = 400, description = "Category still referenced by products", body = ErrorBody),
        (status = 403, description = "Superadmin only", body = ErrorBody),
        (status = 404, description = "Category not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn hard_delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    ensure_superadmin(&user)?;
    category_service::hard_delete_category(&state, id).await?;
    Ok(Json(MessageResponse::new("Category permanently deleted")))
}
