use sea_orm::entity::prelude::*;

/// Join rows behind an addon's `applicableProducts`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "addon_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub addon_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::addons::Entity",
        from = "Column::AddonId",
        to = "super::addons::Column::Id",
        on_delete = "Cascade"
    )]
    Addon,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::addons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addon.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
