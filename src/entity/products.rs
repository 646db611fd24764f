use sea_orm::entity::prelude::*;

use crate::models::{NutritionalInfo, Variants};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    pub category_id: Uuid,
    pub image_url: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub nutritional_info: Option<NutritionalInfo>,
    #[sea_orm(column_type = "JsonBinary")]
    pub variants: Variants,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_active: bool,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::addon_products::Entity")]
    AddonProducts,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::addon_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AddonProducts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
