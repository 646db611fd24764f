use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        addons::CreateAddonRequest,
        menu::{AddonImport, MenuFile, ProductImport},
        products::CreateProductRequest,
    },
    entity::{Addons, Categories, Products, addons, categories, products},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    services::{addon_service, category_service, product_service},
    state::AppState,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportCount {
    pub created: usize,
    /// Entries whose name already belongs to an active record.
    pub skipped: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub categories: ImportCount,
    pub products: ImportCount,
    pub addons: ImportCount,
}

/// Loads a menu file through the regular create paths.
///
/// Re-running the same file only creates what is missing. The first invalid
/// entry or unresolved reference stops the import; earlier entries stay.
pub async fn import_menu(
    state: &AppState,
    user: &AuthUser,
    menu: MenuFile,
) -> AppResult<ImportSummary> {
    let mut summary = ImportSummary::default();

    let mut category_ids = active_category_ids(state).await?;
    for payload in menu.categories {
        payload.validate()?;
        if category_ids.contains_key(&payload.name) {
            summary.categories.skipped += 1;
            continue;
        }
        let category = category_service::create_category(state, user, payload).await?;
        category_ids.insert(category.name, category.id);
        summary.categories.created += 1;
    }

    let mut product_ids = active_product_ids(state).await?;
    for entry in menu.products {
        if product_ids.contains_key(&entry.name) {
            summary.products.skipped += 1;
            continue;
        }
        let category_id = *category_ids.get(&entry.category).ok_or_else(|| {
            AppError::Conflict(format!(
                "Unknown category {} for product {}",
                entry.category, entry.name
            ))
        })?;
        let payload = product_request(entry, category_id);
        payload.validate()?;
        let product = product_service::create_product(state, user, payload).await?;
        product_ids.insert(product.name, product.id);
        summary.products.created += 1;
    }

    let mut addon_names = active_addon_names(state).await?;
    for entry in menu.addons {
        if addon_names.contains(&entry.name) {
            summary.addons.skipped += 1;
            continue;
        }
        let payload = addon_request(entry, &product_ids)?;
        payload.validate()?;
        let addon = addon_service::create_addon(state, user, payload).await?;
        addon_names.insert(addon.name);
        summary.addons.created += 1;
    }

    tracing::info!(?summary, user_id = %user.user_id, "menu imported");
    Ok(summary)
}

fn product_request(entry: ProductImport, category_id: Uuid) -> CreateProductRequest {
    CreateProductRequest {
        name: entry.name,
        description: entry.description,
        price: entry.price,
        category_id,
        image_url: entry.image_url,
        nutritional_info: entry.nutritional_info,
        variants: entry.variants,
        is_vegetarian: entry.is_vegetarian,
        is_vegan: entry.is_vegan,
        is_gluten_free: entry.is_gluten_free,
    }
}

fn addon_request(
    entry: AddonImport,
    product_ids: &HashMap<String, Uuid>,
) -> AppResult<CreateAddonRequest> {
    let mut applicable_products = Vec::with_capacity(entry.applicable_products.len());
    for name in &entry.applicable_products {
        let id = product_ids.get(name.trim()).ok_or_else(|| {
            AppError::Conflict(format!("Unknown product {name} for addon {}", entry.name))
        })?;
        applicable_products.push(*id);
    }

    Ok(CreateAddonRequest {
        name: entry.name,
        description: entry.description,
        price: entry.price,
        selection_type: entry.selection_type,
        addon_type: entry.addon_type,
        image_url: entry.image_url,
        applicable_products,
    })
}

async fn active_category_ids(state: &AppState) -> AppResult<HashMap<String, Uuid>> {
    let rows: Vec<(Uuid, String)> = Categories::find()
        .select_only()
        .column(categories::Column::Id)
        .column(categories::Column::Name)
        .filter(categories::Column::IsActive.eq(true))
        .into_tuple()
        .all(&state.orm)
        .await?;
    Ok(rows.into_iter().map(|(id, name)| (name, id)).collect())
}

async fn active_product_ids(state: &AppState) -> AppResult<HashMap<String, Uuid>> {
    let rows: Vec<(Uuid, String)> = Products::find()
        .select_only()
        .column(products::Column::Id)
        .column(products::Column::Name)
        .filter(products::Column::IsActive.eq(true))
        .into_tuple()
        .all(&state.orm)
        .await?;
    Ok(rows.into_iter().map(|(id, name)| (name, id)).collect())
}

async fn active_addon_names(state: &AppState) -> AppResult<HashSet<String>> {
    let names: Vec<String> = Addons::find()
        .select_only()
        .column(addons::Column::Name)
        .filter(addons::Column::IsActive.eq(true))
        .into_tuple()
        .all(&state.orm)
        .await?;
    Ok(names.into_iter().collect())
}
