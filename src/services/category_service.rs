use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::categories::{CreateCategoryRequest, UpdateCategoryRequest},
    entity::{
        Categories, Products,
        categories::{ActiveModel, Column, Model as CategoryModel},
        products::Column as ProductCol,
    },
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::AuthUser,
    models::Category,
    response::{Page, PageMeta},
    routes::params::{CategoryQuery, CategorySortBy, PageRequest, search_term},
    services::{image_service, search_condition},
    state::AppState,
};

const DUPLICATE_NAME: &str = "Category with this name already exists";

pub fn build_filter(query: &CategoryQuery) -> Condition {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));
    if let Some(term) = search_term(&query.search) {
        condition = condition.add(search_condition(Column::Name, Column::Description, term));
    }
    condition
}

pub async fn count_categories<C: ConnectionTrait>(db: &C, filter: Condition) -> AppResult<u64> {
    Ok(Categories::find().filter(filter).count(db).await?)
}

pub async fn find_categories_page<C: ConnectionTrait>(
    db: &C,
    filter: Condition,
    sort_by: CategorySortBy,
    order: sea_orm::Order,
    skip: u64,
    limit: u64,
) -> AppResult<Vec<CategoryModel>> {
    let sort_col = match sort_by {
        CategorySortBy::CreatedAt => Column::CreatedAt,
        CategorySortBy::UpdatedAt => Column::UpdatedAt,
        CategorySortBy::Name => Column::Name,
    };
    let items = Categories::find()
        .filter(filter)
        .order_by(sort_col, order.clone())
        .order_by(Column::Id, order)
        .offset(skip)
        .limit(limit)
        .all(db)
        .await?;
    Ok(items)
}

pub async fn list_categories(state: &AppState, query: CategoryQuery) -> AppResult<Page<Category>> {
    let page = PageRequest::new(query.page, query.limit);
    let filter = build_filter(&query);
    let sort_by = query.sort_by.unwrap_or_default();
    let order = query.sort_direction.unwrap_or_default().as_order();

    let total = count_categories(&state.orm, filter.clone()).await?;
    let items = find_categories_page(&state.orm, filter, sort_by, order, page.skip(), page.limit)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(Page::new(items, PageMeta::new(page.page, page.limit, total)))
}

pub(crate) async fn find_active<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<CategoryModel>> {
    Ok(Categories::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await?)
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<Category> {
    find_active(&state.orm, id)
        .await?
        .map(category_from_entity)
        .ok_or_else(|| AppError::not_found("Category"))
}

async fn ensure_name_available(
    state: &AppState,
    name: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Categories::find()
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

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<Category> {
    let name = payload.name.trim().to_string();
    ensure_name_available(state, &name, None).await?;

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description.trim().to_string()),
        image_url: Set(payload.image_url),
        thumbnail_url: Set(payload.thumbnail_url),
        is_active: Set(true),
        created_by: Set(user.user_id),
        updated_by: Set(user.user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let category = active
        .insert(&state.orm)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

    tracing::info!(category_id = %category.id, user_id = %user.user_id, "category created");
    Ok(category_from_entity(category))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<Category> {
    let existing = find_active(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let mut active: ActiveModel = existing.clone().into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name != existing.name {
            ensure_name_available(state, &name, Some(id)).await?;
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(thumbnail_url) = payload.thumbnail_url {
        active.thumbnail_url = Set(Some(thumbnail_url));
    }
    active.updated_by = Set(user.user_id);
    active.updated_at = Set(Utc::now().into());

    let category = active
        .update(&state.orm)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;
    Ok(category_from_entity(category))
}

pub async fn delete_category(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<Category> {
    let existing = find_active(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let mut active: ActiveModel = existing.into();
    active.is_active = Set(false);
    active.updated_by = Set(user.user_id);
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    tracing::info!(category_id = %id, user_id = %user.user_id, "category soft-deleted");
    Ok(category_from_entity(category))
}

/// Removes the row for good, then makes a best-effort pass over its images.
pub async fn hard_delete_category(state: &AppState, id: Uuid) -> AppResult<()> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let referenced = Products::find()
        .filter(ProductCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "Category is referenced by products and cannot be permanently deleted".into(),
        ));
    }

    Categories::delete_by_id(id).exec(&state.orm).await?;

    let urls: Vec<String> = std::iter::once(category.image_url)
        .chain(category.thumbnail_url)
        .collect();
    image_service::delete_images(state, &urls).await;

    tracing::info!(category_id = %id, "category permanently deleted");
    Ok(())
}

pub(crate) fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        image_url: model.image_url,
        thumbnail_url: model.thumbnail_url,
        is_active: model.is_active,
        created_by: model.created_by,
        updated_by: model.updated_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
