mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{MemoryImageStore, TestApp, delete_request, json_request, setup};
use menu_admin_api::{
    dto::{
        categories::CreateCategoryRequest,
        products::{CreateProductRequest, NutritionalInfoInput, UpdateProductRequest, VariantInput},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Category,
    routes::params::{ProductQuery, ProductSortBy, SortDirection},
    services::{category_service, product_service},
};

async fn category(app: &TestApp, admin: &AuthUser, name: &str) -> Category {
    category_service::create_category(
        &app.state,
        admin,
        CreateCategoryRequest {
            name: name.into(),
            description: format!("All the {name}"),
            image_url: "https://images.test/categories/c.png".into(),
            thumbnail_url: None,
        },
    )
    .await
    .unwrap()
}

fn product(name: &str, category_id: Uuid, price: f64) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        description: format!("{name}, freshly made"),
        price,
        category_id,
        image_url: format!("https://images.test/products/{}.png", name.to_lowercase()),
        nutritional_info: None,
        variants: Vec::new(),
        is_vegetarian: false,
        is_vegan: false,
        is_gluten_free: false,
    }
}

fn variant(name: &str, price: f64, is_default: bool) -> VariantInput {
    VariantInput {
        name: name.into(),
        price,
        is_default,
    }
}

#[tokio::test]
async fn product_in_active_category_embeds_category() {
    let app = setup().await;
    let (_, _, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;

    let latte = product_service::create_product(&app.state, &admin, product("Latte", drinks.id, 3.5))
        .await
        .unwrap();

    assert_eq!(latte.category_id, drinks.id);
    let embedded = latte.category.expect("category populated");
    assert_eq!(embedded.id, drinks.id);
    assert_eq!(embedded.name, "Drinks");
    assert_eq!(latte.created_by, admin.user_id);
    assert_eq!(latte.updated_by, admin.user_id);
}

#[tokio::test]
async fn unknown_or_inactive_category_is_rejected_the_same_way() {
    let app = setup().await;
    let (_, _, admin) = app.admin().await;

    let unknown = product_service::create_product(
        &app.state,
        &admin,
        product("Latte", Uuid::new_v4(), 3.5),
    )
    .await
    .unwrap_err();
    assert!(matches!(unknown, AppError::Conflict(ref m) if m == "Category not found or inactive"));

    let drinks = category(&app, &admin, "Drinks").await;
    category_service::delete_category(&app.state, &admin, drinks.id)
        .await
        .unwrap();
    let inactive =
        product_service::create_product(&app.state, &admin, product("Latte", drinks.id, 3.5))
            .await
            .unwrap_err();
    assert_eq!(inactive.to_string(), unknown.to_string());
}

#[tokio::test]
async fn update_revalidates_category_reference() {
    let app = setup().await;
    let (_, _, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;
    let latte = product_service::create_product(&app.state, &admin, product("Latte", drinks.id, 3.5))
        .await
        .unwrap();

    let err = product_service::update_product(
        &app.state,
        &admin,
        latte.id,
        UpdateProductRequest {
            category_id: Some(Uuid::new_v4()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_product_name_conflicts() {
    let app = setup().await;
    let (_, _, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;

    product_service::create_product(&app.state, &admin, product("Mocha", drinks.id, 4.0))
        .await
        .unwrap();
    let err = product_service::create_product(&app.state, &admin, product("Mocha", drinks.id, 4.5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Product with this name already exists"));
}

#[tokio::test]
async fn first_variant_is_promoted_when_none_is_default() {
    let app = setup().await;
    let (_, _, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;

    let mut payload = product("Cappuccino", drinks.id, 3.0);
    payload.variants = vec![variant("Small", 3.0, false), variant("Large", 4.0, false)];
    payload.nutritional_info = Some(NutritionalInfoInput {
        calories: Some(120.0),
        protein: Some(6.0),
        carbohydrates: None,
        fat: Some(4.5),
    });
    let created = product_service::create_product(&app.state, &admin, payload)
        .await
        .unwrap();

    assert_eq!(created.variants.len(), 2);
    assert!(created.variants[0].is_default);
    assert!(!created.variants[1].is_default);
    let info = created.nutritional_info.unwrap();
    assert_eq!(info.calories, Some(120.0));
    assert_eq!(info.carbohydrates, None);

    let fetched = product_service::get_product(&app.state, created.id).await.unwrap();
    assert_eq!(fetched.variants, created.variants);
}

#[tokio::test]
async fn two_default_variants_fail_validation() {
    let app = setup().await;
    let (_, bearer, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;

    let (status, _, body) = app
        .request(json_request(
            "POST",
            "/api/product",
            Some(&bearer),
            json!({
                "name": "Flat White",
                "description": "Velvety",
                "price": 3.2,
                "categoryId": drinks.id,
                "imageUrl": "https://images.test/products/flat-white.png",
                "variants": [
                    { "name": "Small", "price": 3.2, "isDefault": true },
                    { "name": "Large", "price": 4.1, "isDefault": true }
                ]
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"]["variants"].is_object() || body["errors"]["variants"].is_array());
}

#[tokio::test]
async fn partial_update_only_touches_given_fields() {
    let app = setup().await;
    let (_, _, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;
    let mut payload = product("Chai", drinks.id, 2.8);
    payload.is_vegetarian = true;
    payload.variants = vec![variant("Regular", 2.8, true)];
    let before = product_service::create_product(&app.state, &admin, payload)
        .await
        .unwrap();

    let after = product_service::update_product(
        &app.state,
        &admin,
        before.id,
        UpdateProductRequest {
            price: Some(3.1),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(after.price, 3.1);
    assert_eq!(after.name, before.name);
    assert_eq!(after.description, before.description);
    assert_eq!(after.category_id, before.category_id);
    assert_eq!(after.image_url, before.image_url);
    assert_eq!(after.variants, before.variants);
    assert_eq!(after.is_vegetarian, before.is_vegetarian);
    assert_eq!(after.nutritional_info, before.nutritional_info);
}

#[tokio::test]
async fn list_filters_by_category_and_dietary_flags() {
    let app = setup().await;
    let (_, _, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;
    let food = category(&app, &admin, "Food").await;

    let mut oat = product("Oat Latte", drinks.id, 4.0);
    oat.is_vegan = true;
    oat.is_vegetarian = true;
    product_service::create_product(&app.state, &admin, oat).await.unwrap();
    product_service::create_product(&app.state, &admin, product("Latte", drinks.id, 3.5))
        .await
        .unwrap();
    let mut salad = product("Salad", food.id, 7.0);
    salad.is_vegan = true;
    product_service::create_product(&app.state, &admin, salad).await.unwrap();

    let vegan_drinks = product_service::list_products(
        &app.state,
        ProductQuery {
            category_id: Some(drinks.id),
            vegan: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(vegan_drinks.pagination.total, 1);
    assert_eq!(vegan_drinks.data[0].name, "Oat Latte");
    assert_eq!(vegan_drinks.data[0].category.as_ref().unwrap().name, "Drinks");

    let by_price = product_service::list_products(
        &app.state,
        ProductQuery {
            sort_by: Some(ProductSortBy::Price),
            sort_direction: Some(SortDirection::Asc),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let prices: Vec<f64> = by_price.data.iter().map(|p| p.price).collect();
    assert_eq!(prices, [3.5, 4.0, 7.0]);

    let search = product_service::list_products(
        &app.state,
        ProductQuery {
            search: Some("latte".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(search.pagination.total, 2);
}

#[tokio::test]
async fn soft_delete_hides_product_and_second_delete_fails() {
    let app = setup().await;
    let (_, _, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;
    let latte = product_service::create_product(&app.state, &admin, product("Latte", drinks.id, 3.5))
        .await
        .unwrap();

    product_service::delete_product(&app.state, &admin, latte.id)
        .await
        .unwrap();
    assert!(matches!(
        product_service::get_product(&app.state, latte.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        product_service::delete_product(&app.state, &admin, latte.id).await,
        Err(AppError::NotFound(_))
    ));

    let page = product_service::list_products(&app.state, ProductQuery::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 0);

    let again = product_service::create_product(&app.state, &admin, product("Latte", drinks.id, 3.6))
        .await
        .unwrap();
    assert_ne!(again.id, latte.id);
}

#[tokio::test]
async fn permanent_delete_removes_row_and_image() {
    let app = setup().await;
    let (_, root_bearer, root) = app.superadmin().await;
    let drinks = category(&app, &root, "Drinks").await;

    let key = "products/espresso.png";
    app.images
        .objects
        .lock()
        .unwrap()
        .insert(key.into(), (vec![0xff], "image/png".into()));
    let mut payload = product("Espresso", drinks.id, 2.0);
    payload.image_url = MemoryImageStore::url_for(key);
    let espresso = product_service::create_product(&app.state, &root, payload)
        .await
        .unwrap();

    let (status, _, _) = app
        .request(delete_request(
            &format!("/api/product/{}/permanent", espresso.id),
            Some(&root_bearer),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.images.contains(key));

    // The category is no longer referenced, so it can go too.
    category_service::hard_delete_category(&app.state, drinks.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn blank_or_padded_short_names_are_rejected() {
    let app = setup().await;
    let (_, bearer, admin) = app.admin().await;
    let drinks = category(&app, &admin, "Drinks").await;

    let body_with = |name: &str, description: &str| {
        json!({
            "name": name,
            "description": description,
            "price": 2.5,
            "categoryId": drinks.id,
            "imageUrl": "https://images.test/products/p.png"
        })
    };

    let (status, _, body) = app
        .request(json_request("POST", "/api/product", Some(&bearer), body_with("    ", "   ")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["description"].is_array());

    let (status, _, body) = app
        .request(json_request("POST", "/api/product", Some(&bearer), body_with("  a  ", "Fizzy")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body["errors"]["name"].is_array());

    let cola = product_service::create_product(&app.state, &admin, product("Cola", drinks.id, 2.0))
        .await
        .unwrap();
    let (status, _, body) = app
        .request(json_request(
            "PUT",
            &format!("/api/product/{}", cola.id),
            Some(&bearer),
            json!({ "name": "  b  " }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body["errors"]["name"].is_array());
}
