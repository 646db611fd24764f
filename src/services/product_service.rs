use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, UpdateProductRequest, VariantInput},
    entity::{
        AddonProducts, Categories, Products,
        addon_products::Column as AddonProductCol,
        categories::Column as CategoryCol,
        products::{ActiveModel, Column, Model as ProductModel},
    },
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::AuthUser,
    models::{CategoryRef, Product, Variant, Variants},
    response::{Page, PageMeta},
    routes::params::{PageRequest, ProductQuery, ProductSortBy, search_term},
    services::{category_service, image_service, search_condition},
    state::AppState,
};

const DUPLICATE_NAME: &str = "Product with this name already exists";
const INACTIVE_CATEGORY: &str = "Category not found or inactive";

/// Rejects more than one default; promotes the first variant when none is flagged.
pub fn normalize_variants(inputs: Vec<VariantInput>) -> AppResult<Vec<Variant>> {
    let defaults = inputs.iter().filter(|v| v.is_default).count();
    if defaults > 1 {
        return Err(AppError::BadRequest(
            "Only one variant can be marked as default".into(),
        ));
    }

    let mut variants: Vec<Variant> = inputs
        .into_iter()
        .map(|v| Variant {
            name: v.name.trim().to_string(),
            price: v.price,
            is_default: v.is_default,
        })
        .collect();
    if defaults == 0 {
        if let Some(first) = variants.first_mut() {
            first.is_default = true;
        }
    }
    Ok(variants)
}

pub fn build_filter(query: &ProductQuery) -> Condition {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));
    if let Some(term) = search_term(&query.search) {
        condition = condition.add(search_condition(Column::Name, Column::Description, term));
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(vegetarian) = query.vegetarian {
        condition = condition.add(Column::IsVegetarian.eq(vegetarian));
    }
    if let Some(vegan) = query.vegan {
        condition = condition.add(Column::IsVegan.eq(vegan));
    }
    if let Some(gluten_free) = query.gluten_free {
        condition = condition.add(Column::IsGlutenFree.eq(gluten_free));
    }
    condition
}

pub async fn count_products<C: ConnectionTrait>(db: &C, filter: Condition) -> AppResult<u64> {
    Ok(Products::find().filter(filter).count(db).await?)
}

pub async fn find_products_page<C: ConnectionTrait>(
    db: &C,
    filter: Condition,
    sort_by: ProductSortBy,
    order: sea_orm::Order,
    skip: u64,
    limit: u64,
) -> AppResult<Vec<ProductModel>> {
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::UpdatedAt => Column::UpdatedAt,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Price => Column::Price,
    };
    let items = Products::find()
        .filter(filter)
        .order_by(sort_col, order.clone())
        .order_by(Column::Id, order)
        .offset(skip)
        .limit(limit)
        .all(db)
        .await?;
    Ok(items)
}

pub async fn list_products(state: &AppState, query: ProductQuery) -> AppResult<Page<Product>> {
    let page = PageRequest::new(query.page, query.limit);
    let filter = build_filter(&query);
    let sort_by = query.sort_by.unwrap_or_default();
    let order = query.sort_direction.unwrap_or_default().as_order();

    let total = count_products(&state.orm, filter.clone()).await?;
    let models =
        find_products_page(&state.orm, filter, sort_by, order, page.skip(), page.limit).await?;
    let items = populate_categories(&state.orm, models).await?;

    Ok(Page::new(items, PageMeta::new(page.page, page.limit, total)))
}

pub(crate) async fn find_active<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<ProductModel>> {
    Ok(Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await?)
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    let model = find_active(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    populate_one(&state.orm, model).await
}

async fn ensure_name_available(
    state: &AppState,
    name: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Products::find()
        .filter(Column::Name.eq(name))
        .filter(Column::IsActive.eq(true));
    if let Some(id) = exclude {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(DUPLICATE_NAME.into()));
    }
    Ok(())
}

async fn ensure_active_category(state: &AppState, category_id: Uuid) -> AppResult<()> {
    if category_service::find_active(&state.orm, category_id)
        .await?
        .is_none()
    {
        return Err(AppError::Conflict(INACTIVE_CATEGORY.into()));
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<Product> {
    let name = payload.name.trim().to_string();
    ensure_name_available(state, &name, None).await?;
    ensure_active_category(state, payload.category_id).await?;
    let variants = normalize_variants(payload.variants)?;

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description.trim().to_string()),
        price: Set(payload.price),
        category_id: Set(payload.category_id),
        image_url: Set(payload.image_url),
        nutritional_info: Set(payload.nutritional_info.map(Into::into)),
        variants: Set(Variants(variants)),
        is_vegetarian: Set(payload.is_vegetarian),
        is_vegan: Set(payload.is_vegan),
        is_gluten_free: Set(payload.is_gluten_free),
        is_active: Set(true),
        created_by: Set(user.user_id),
        updated_by: Set(user.user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let product = active
        .insert(&state.orm)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

    tracing::info!(product_id = %product.id, user_id = %user.user_id, "product created");
    populate_one(&state.orm, product).await
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<Product> {
    let existing = find_active(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let mut active: ActiveModel = existing.clone().into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name != existing.name {
            ensure_name_available(state, &name, Some(id)).await?;
        }
        active.name = Set(name);
    }
    if let Some(category_id) = payload.category_id {
        ensure_active_category(state, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(info) = payload.nutritional_info {
        active.nutritional_info = Set(Some(info.into()));
    }
    if let Some(variants) = payload.variants {
        active.variants = Set(Variants(normalize_variants(variants)?));
    }
    if let Some(flag) = payload.is_vegetarian {
        active.is_vegetarian = Set(flag);
    }
    if let Some(flag) = payload.is_vegan {
        active.is_vegan = Set(flag);
    }
    if let Some(flag) = payload.is_gluten_free {
        active.is_gluten_free = Set(flag);
    }
    active.updated_by = Set(user.user_id);
    active.updated_at = Set(Utc::now().into());

    let product = active
        .update(&state.orm)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;
    populate_one(&state.orm, product).await
}

pub async fn delete_product(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<Product> {
    let existing = find_active(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let mut active: ActiveModel = existing.into();
    active.is_active = Set(false);
    active.updated_by = Set(user.user_id);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    tracing::info!(product_id = %id, user_id = %user.user_id, "product soft-deleted");
    populate_one(&state.orm, product).await
}

pub async fn hard_delete_product(state: &AppState, id: Uuid) -> AppResult<()> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    AddonProducts::delete_many()
        .filter(AddonProductCol::ProductId.eq(id))
        .exec(&state.orm)
        .await?;
    Products::delete_by_id(id).exec(&state.orm).await?;

    image_service::delete_images(state, &[product.image_url]).await;

    tracing::info!(product_id = %id, "product permanently deleted");
    Ok(())
}

/// Attaches `{id, name}` of each product's category with one extra query.
pub(crate) async fn populate_categories<C: ConnectionTrait>(
    db: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let mut ids: Vec<Uuid> = models.iter().map(|p| p.category_id).collect();
    ids.sort();
    ids.dedup();

    let categories: HashMap<Uuid, CategoryRef> = if ids.is_empty() {
        HashMap::new()
    } else {
        Categories::find()
            .filter(CategoryCol::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, CategoryRef { id: c.id, name: c.name }))
            .collect()
    };

    Ok(models
        .into_iter()
        .map(|model| {
            let category = categories.get(&model.category_id).cloned();
            product_from_entity(model, category)
        })
        .collect())
}

async fn populate_one<C: ConnectionTrait>(db: &C, model: ProductModel) -> AppResult<Product> {
    populate_categories(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Product"))
}

pub(crate) fn product_from_entity(model: ProductModel, category: Option<CategoryRef>) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category_id: model.category_id,
        category,
        image_url: model.image_url,
        nutritional_info: model.nutritional_info,
        variants: model.variants.0,
        is_vegetarian: model.is_vegetarian,
        is_vegan: model.is_vegan,
        is_gluten_free: model.is_gluten_free,
        is_active: model.is_active,
        created_by: model.created_by,
        updated_by: model.updated_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
