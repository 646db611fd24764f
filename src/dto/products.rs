use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{trimmed, trimmed_opt};
use crate::models::NutritionalInfo;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Variant name is required"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Variant price cannot be negative"))]
    pub price: f64,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NutritionalInfoInput {
    #[validate(range(min = 0.0, message = "Calories cannot be negative"))]
    pub calories: Option<f64>,
    #[validate(range(min = 0.0, message = "Protein cannot be negative"))]
    pub protein: Option<f64>,
    #[validate(range(min = 0.0, message = "Carbohydrates cannot be negative"))]
    pub carbohydrates: Option<f64>,
    #[validate(range(min = 0.0, message = "Fat cannot be negative"))]
    pub fat: Option<f64>,
}

impl From<NutritionalInfoInput> for NutritionalInfo {
    fn from(input: NutritionalInfoInput) -> Self {
        Self {
            calories: input.calories,
            protein: input.protein,
            carbohydrates: input.carbohydrates,
            fat: input.fat,
        }
    }
}

/// At most one variant may be flagged as the default.
pub fn validate_single_default(variants: &[VariantInput]) -> Result<(), ValidationError> {
    if variants.iter().filter(|v| v.is_default).count() > 1 {
        let mut err = ValidationError::new("multiple_defaults");
        err.message = Some("Only one variant can be marked as default".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Product name must be 2-100 characters"))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 1000, message = "Description is required and cannot exceed 1000 characters"))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    pub category_id: Uuid,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: String,
    #[validate(nested)]
    pub nutritional_info: Option<NutritionalInfoInput>,
    #[serde(default)]
    #[validate(nested, custom(function = "validate_single_default"))]
    pub variants: Vec<VariantInput>,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_gluten_free: bool,
}

/// Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 100, message = "Product name must be 2-100 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    pub category_id: Option<Uuid>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
    #[validate(nested)]
    pub nutritional_info: Option<NutritionalInfoInput>,
    #[validate(nested, custom(function = "validate_single_default"))]
    pub variants: Option<Vec<VariantInput>>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_gluten_free: Option<bool>,
}
