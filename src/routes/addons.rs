use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::addons::{CreateAddonRequest, UpdateAddonRequest},
    error::{AppResult, ErrorBody},
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::{AuthUser, ensure_superadmin},
    models::{Addon, AddonType},
    response::{MessageResponse, Page},
    routes::params::AddonQuery,
    services::addon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addons).post(create_addon))
        .route("/type/{addon_type}", get(list_addons_by_type))
        .route("/product/{product_id}", get(list_addons_by_product))
        .route(
            "/{id}",
            get(get_addon).put(update_addon).delete(delete_addon),
        )
        .route("/{id}/permanent", delete(hard_delete_addon))
}

#[utoipa::path(
    get,
    path = "/api/addon",
    params(AddonQuery),
    responses(
        (status = 200, description = "Active add-ons with their products", body = Page<Addon>),
        (status = 400, description = "Invalid query", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addons"
)]
pub async fn list_addons(
    State(state): State<AppState>,
    _user: AuthUser,
    AppQuery(query): AppQuery<AddonQuery>,
) -> AppResult<Json<Page<Addon>>> {
    query.validate()?;
    Ok(Json(addon_service::list_addons(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/addon/type/{addon_type}",
    params(("addon_type" = AddonType, Path, description = "topping, sauce, extra or option")),
    responses(
        (status = 200, description = "Active add-ons of the type, by name", body = Vec<Addon>),
        (status = 400, description = "Unknown add-on type", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addons"
)]
pub async fn list_addons_by_type(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(addon_type): AppPath<AddonType>,
) -> AppResult<Json<Vec<Addon>>> {
    Ok(Json(
        addon_service::list_addons_by_type(&state, addon_type).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/addon/product/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Active add-ons applicable to the product", body = Vec<Addon>),
        (status = 404, description = "Product not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addons"
)]
pub async fn list_addons_by_product(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(product_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<Addon>>> {
    Ok(Json(
        addon_service::list_addons_by_product(&state, product_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/addon/{id}",
    params(("id" = Uuid, Path, description = "Addon ID")),
    responses(
        (status = 200, description = "Add-on", body = Addon),
        (status = 404, description = "Addon not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addons"
)]
pub async fn get_addon(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Addon>> {
    Ok(Json(addon_service::get_addon(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/addon",
    request_body = CreateAddonRequest,
    responses(
        (status = 201, description = "Add-on created", body = Addon),
        (status = 400, description = "Validation failed, duplicate name or inactive products", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addons"
)]
pub async fn create_addon(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateAddonRequest>,
) -> AppResult<(StatusCode, Json<Addon>)> {
    payload.validate()?;
    let addon = addon_service::create_addon(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(addon)))
}

#[utoipa::path(
    put,
    path = "/api/addon/{id}",
    params(("id" = Uuid, Path, description = "Addon ID")),
    request_body = UpdateAddonRequest,
    responses(
        (status = 200, description = "Add-on updated", body = Addon),
        (status = 400, description = "Validation failed, duplicate name or inactive products", body = ErrorBody),
        (status = 404, description = "Addon not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addons"
)]
pub async fn update_addon(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateAddonRequest>,
) -> AppResult<Json<Addon>> {
    payload.validate()?;
    let addon = addon_service::update_addon(&state, &user, id, payload).await?;
    Ok(Json(addon))
}

#[utoipa::path(
    delete,
    path = "/api/addon/{id}",
    params(("id" = Uuid, Path, description = "Addon ID")),
    responses(
        (status = 200, description = "Add-on deactivated", body = MessageResponse),
        (status = 404, description = "Addon not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addons"
)]
pub async fn delete_addon(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    addon_service::delete_addon(&state, &user, id).await?;
    Ok(Json(MessageResponse::new("Addon deleted successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/addon/{id}/permanent",
    params(("id" = Uuid, Path, description = "Addon ID")),
    responses(
        (status = 200, description = "Add-on removed", body = MessageResponse),
        (status = 403, description = "Superadmin only", body = ErrorBody),
        (status = 404, description = "Addon not found", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addons"
)]
pub async fn hard_delete_addon(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    ensure_superadmin(&user)?;
    addon_service::hard_delete_addon(&state, id).await?;
    Ok(Json(MessageResponse::new("Addon permanently deleted")))
}
