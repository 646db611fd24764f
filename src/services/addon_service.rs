use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::addons::{CreateAddonRequest, UpdateAddonRequest},
    entity::{
        AddonProducts, Addons, Products,
        addon_products::{ActiveModel as AddonProductActive, Column as AddonProductCol},
        addons::{ActiveModel, Column, Model as AddonModel},
        products::Column as ProductCol,
    },
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::AuthUser,
    models::{Addon, AddonType, ProductRef},
    response::{Page, PageMeta},
    routes::params::{AddonQuery, AddonSortBy, PageRequest, search_term},
    services::{image_service, product_service, search_condition},
    state::AppState,
};

const DUPLICATE_NAME: &str = "Addon with this name already exists";

pub fn build_filter(query: &AddonQuery) -> Condition {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));
    if let Some(term) = search_term(&query.search) {
        condition = condition.add(search_condition(Column::Name, Column::Description, term));
    }
    if let Some(addon_type) = query.addon_type {
        condition = condition.add(Column::AddonType.eq(addon_type));
    }
    if let Some(selection_type) = query.selection_type {
        condition = condition.add(Column::SelectionType.eq(selection_type));
    }
    if let Some(product_id) = query.product_id {
        condition = condition.add(applicable_to(product_id));
    }
    condition
}

fn applicable_to(product_id: Uuid) -> sea_orm::sea_query::SimpleExpr {
    Column::Id.in_subquery(
        AddonProducts::find()
            .select_only()
            .column(AddonProductCol::AddonId)
            .filter(AddonProductCol::ProductId.eq(product_id))
            .into_query(),
    )
}

pub async fn count_addons<C: ConnectionTrait>(db: &C, filter: Condition) -> AppResult<u64> {
    Ok(Addons::find().filter(filter).count(db).await?)
}

pub async fn find_addons_page<C: ConnectionTrait>(
    db: &C,
    filter: Condition,
    sort_by: AddonSortBy,
    order: sea_orm::Order,
    skip: u64,
    limit: u64,
) -> AppResult<Vec<AddonModel>> {
    let sort_col = match sort_by {
        AddonSortBy::CreatedAt => Column::CreatedAt,
        AddonSortBy::UpdatedAt => Column::UpdatedAt,
        AddonSortBy::Name => Column::Name,
        AddonSortBy::Price => Column::Price,
    };
    let items = Addons::find()
        .filter(filter)
        .order_by(sort_col, order.clone())
        .order_by(Column::Id, order)
        .offset(skip)
        .limit(limit)
        .all(db)
        .await?;
    Ok(items)
}

pub async fn list_addons(state: &AppState, query: AddonQuery) -> AppResult<Page<Addon>> {
    let page = PageRequest::new(query.page, query.limit);
    let filter = build_filter(&query);
    let sort_by = query.sort_by.unwrap_or_default();
    let order = query.sort_direction.unwrap_or_default().as_order();

    let total = count_addons(&state.orm, filter.clone()).await?;
    let models =
        find_addons_page(&state.orm, filter, sort_by, order, page.skip(), page.limit).await?;
    let items = populate_products(&state.orm, models).await?;

    Ok(Page::new(items, PageMeta::new(page.page, page.limit, total)))
}

/// Active add-ons of one type, by name.
pub async fn list_addons_by_type(state: &AppState, addon_type: AddonType) -> AppResult<Vec<Addon>> {
    let models = Addons::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::AddonType.eq(addon_type))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;
    populate_products(&state.orm, models).await
}

/// Active add-ons applicable to an active product, by name.
pub async fn list_addons_by_product(state: &AppState, product_id: Uuid) -> AppResult<Vec<Addon>> {
    if product_service::find_active(&state.orm, product_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("Product"));
    }

    let models = Addons::find()
        .filter(Column::IsActive.eq(true))
        .filter(applicable_to(product_id))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;
    populate_products(&state.orm, models).await
}

pub(crate) async fn find_active<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<AddonModel>> {
    Ok(Addons::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await?)
}

pub async fn get_addon(state: &AppState, id: Uuid) -> AppResult<Addon> {
    let model = find_active(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Addon"))?;
    populate_one(&state.orm, model).await
}

async fn ensure_name_available(
    state: &AppState,
    name: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Addons::find()
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

/// Deduplicates `ids` and checks each one is an active product.
pub async fn validate_applicable_products<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> AppResult<Vec<Uuid>> {
    let mut seen = HashSet::new();
    let ids: Vec<Uuid> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if ids.is_empty() {
        return Ok(ids);
    }

    let found: HashSet<Uuid> = Products::find()
        .filter(ProductCol::Id.is_in(ids.clone()))
        .filter(ProductCol::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(Uuid::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Conflict(format!(
            "Product(s) not found or inactive: {}",
            missing.join(", ")
        )));
    }
    Ok(ids)
}

async fn insert_links<C: ConnectionTrait>(db: &C, addon_id: Uuid, product_ids: &[Uuid]) -> AppResult<()> {
    if product_ids.is_empty() {
        return Ok(());
    }
    let rows = product_ids.iter().map(|product_id| AddonProductActive {
        addon_id: Set(addon_id),
        product_id: Set(*product_id),
    });
    AddonProducts::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn create_addon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddonRequest,
) -> AppResult<Addon> {
    let name = payload.name.trim().to_string();
    ensure_name_available(state, &name, None).await?;
    let product_ids = validate_applicable_products(&state.orm, payload.applicable_products).await?;

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description.trim().to_string()),
        price: Set(payload.price),
        selection_type: Set(payload.selection_type),
        addon_type: Set(payload.addon_type),
        image_url: Set(payload.image_url),
        is_active: Set(true),
        created_by: Set(user.user_id),
        updated_by: Set(user.user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    let txn = state.orm.begin().await?;
    let addon = active
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;
    insert_links(&txn, addon.id, &product_ids).await?;
    txn.commit().await?;

    tracing::info!(addon_id = %addon.id, user_id = %user.user_id, "addon created");
    populate_one(&state.orm, addon).await
}

pub async fn update_addon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddonRequest,
) -> AppResult<Addon> {
    let existing = find_active(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Addon"))?;

    let mut active: ActiveModel = existing.clone().into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name != existing.name {
            ensure_name_available(state, &name, Some(id)).await?;
        }
        active.name = Set(name);
    }
    let product_ids = match payload.applicable_products {
        Some(ids) => Some(validate_applicable_products(&state.orm, ids).await?),
        None => None,
    };
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(selection_type) = payload.selection_type {
        active.selection_type = Set(selection_type);
    }
    if let Some(addon_type) = payload.addon_type {
        active.addon_type = Set(addon_type);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.updated_by = Set(user.user_id);
    active.updated_at = Set(Utc::now().into());

    let txn = state.orm.begin().await?;
    let addon = active
        .update(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;
    if let Some(product_ids) = product_ids {
        AddonProducts::delete_many()
            .filter(AddonProductCol::AddonId.eq(id))
            .exec(&txn)
            .await?;
        insert_links(&txn, id, &product_ids).await?;
    }
    txn.commit().await?;

    populate_one(&state.orm, addon).await
}

pub async fn delete_addon(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<Addon> {
    let existing = find_active(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Addon"))?;

    let mut active: ActiveModel = existing.into();
    active.is_active = Set(false);
    active.updated_by = Set(user.user_id);
    active.updated_at = Set(Utc::now().into());
    let addon = active.update(&state.orm).await?;

    tracing::info!(addon_id = %id, user_id = %user.user_id, "addon soft-deleted");
    populate_one(&state.orm, addon).await
}

pub async fn hard_delete_addon(state: &AppState, id: Uuid) -> AppResult<()> {
    let addon = Addons::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Addon"))?;

    let txn = state.orm.begin().await?;
    AddonProducts::delete_many()
        .filter(AddonProductCol::AddonId.eq(id))
        .exec(&txn)
        .await?;
    Addons::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    let urls: Vec<String> = addon.image_url.into_iter().collect();
    image_service::delete_images(state, &urls).await;

    tracing::info!(addon_id = %id, "addon permanently deleted");
    Ok(())
}

/// Attaches `{id, name}` of every linked product, ordered by name.
async fn populate_products<C: ConnectionTrait>(
    db: &C,
    models: Vec<AddonModel>,
) -> AppResult<Vec<Addon>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let addon_ids: Vec<Uuid> = models.iter().map(|a| a.id).collect();
    let links = AddonProducts::find()
        .filter(AddonProductCol::AddonId.is_in(addon_ids))
        .all(db)
        .await?;

    let mut product_ids: Vec<Uuid> = links.iter().map(|l| l.product_id).collect();
    product_ids.sort();
    product_ids.dedup();
    let names: HashMap<Uuid, String> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        Products::find()
            .filter(ProductCol::Id.is_in(product_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect()
    };

    let mut by_addon: HashMap<Uuid, Vec<ProductRef>> = HashMap::new();
    for link in links {
        if let Some(name) = names.get(&link.product_id) {
            by_addon.entry(link.addon_id).or_default().push(ProductRef {
                id: link.product_id,
                name: name.clone(),
            });
        }
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let mut products = by_addon.remove(&model.id).unwrap_or_default();
            products.sort_by(|a, b| a.name.cmp(&b.name));
            addon_from_entity(model, products)
        })
        .collect())
}

async fn populate_one<C: ConnectionTrait>(db: &C, model: AddonModel) -> AppResult<Addon> {
    populate_products(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Addon"))
}

fn addon_from_entity(model: AddonModel, applicable_products: Vec<ProductRef>) -> Addon {
    Addon {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        selection_type: model.selection_type,
        addon_type: model.addon_type,
        image_url: model.image_url,
        applicable_products,
        is_active: model.is_active,
        created_by: model.created_by,
        updated_by: model.updated_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
