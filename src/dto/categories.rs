use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::{trimmed, trimmed_opt};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 100, message = "Category name must be 3-100 characters"))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 500, message = "Description is required and cannot exceed 500 characters"))]
    pub description: String,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: String,
    #[validate(url(message = "Thumbnail URL must be a valid URL"))]
    pub thumbnail_url: Option<String>,
}

/// Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 3, max = 100, message = "Category name must be 3-100 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
    #[validate(url(message = "Thumbnail URL must be a valid URL"))]
    pub thumbnail_url: Option<String>,
}
