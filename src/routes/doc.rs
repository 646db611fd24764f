use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{addons, auth as auth_dto, categories as category_dto, products as product_dto, uploads},
    error::ErrorBody,
    models::{
        Addon, AddonType, Category, CategoryRef, NutritionalInfo, Product, ProductRef,
        SelectionType, Variant,
    },
    response::{MessageResponse, PageMeta},
    routes::{addons as addon_routes, auth, categories, health, params, products, upload},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::refresh,
        auth::forgot_password,
        auth::reset_password,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        categories::hard_delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::hard_delete_product,
        addon_routes::list_addons,
        addon_routes::list_addons_by_type,
        addon_routes::list_addons_by_product,
        addon_routes::get_addon,
        addon_routes::create_addon,
        addon_routes::update_addon,
        addon_routes::delete_addon,
        addon_routes::hard_delete_addon,
        upload::upload_image,
        upload::delete_image
    ),
    components(
        schemas(
            Category,
            CategoryRef,
            Product,
            ProductRef,
            Variant,
            NutritionalInfo,
            Addon,
            AddonType,
            SelectionType,
            PageMeta,
            MessageResponse,
            ErrorBody,
            auth_dto::LoginRequest,
            auth_dto::RefreshRequest,
            auth_dto::ForgotPasswordRequest,
            auth_dto::ResetPasswordRequest,
            auth_dto::TokenResponse,
            category_dto::CreateCategoryRequest,
            category_dto::UpdateCategoryRequest,
            product_dto::CreateProductRequest,
            product_dto::UpdateProductRequest,
            product_dto::VariantInput,
            product_dto::NutritionalInfoInput,
            addons::CreateAddonRequest,
            addons::UpdateAddonRequest,
            uploads::UploadResponse,
            uploads::UploadForm,
            uploads::DeleteImageRequest,
            params::SortDirection,
            params::CategorySortBy,
            params::ProductSortBy
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Login, token refresh and password reset"),
        (name = "Categories", description = "Menu category management"),
        (name = "Products", description = "Product management"),
        (name = "Addons", description = "Add-on management"),
        (name = "Upload", description = "Image upload"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
