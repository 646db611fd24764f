use serde::Deserialize;

use super::{
    categories::CreateCategoryRequest,
    products::{NutritionalInfoInput, VariantInput},
    trimmed,
};
use crate::models::{AddonType, SelectionType};

/// A menu export: categories, then products and add-ons that refer to them by name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuFile {
    #[serde(default)]
    pub categories: Vec<CreateCategoryRequest>,
    #[serde(default)]
    pub products: Vec<ProductImport>,
    #[serde(default)]
    pub addons: Vec<AddonImport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImport {
    #[serde(deserialize_with = "trimmed")]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    pub description: String,
    pub price: f64,
    /// Name of an active category.
    #[serde(deserialize_with = "trimmed")]
    pub category: String,
    pub image_url: String,
    pub nutritional_info: Option<NutritionalInfoInput>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_gluten_free: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonImport {
    #[serde(deserialize_with = "trimmed")]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    pub description: String,
    pub price: f64,
    pub selection_type: SelectionType,
    pub addon_type: AddonType,
    pub image_url: Option<String>,
    /// Names of active products.
    #[serde(default)]
    pub applicable_products: Vec<String>,
}
