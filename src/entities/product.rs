use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::attributes::ProductAttributes;

/// Catalog product
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub product_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub stock_quantity: i32,
    #[sea_orm(nullable)]
    pub image_url: Option<String>,
    /// Serialized key/value mapping, see [`ProductAttributes`]
    #[sea_orm(column_type = "Text", nullable)]
    pub attributes: Option<String>,
}

impl Model {
    /// Typed view of the stored attributes; malformed payloads read as empty.
    pub fn parsed_attributes(&self) -> ProductAttributes {
        ProductAttributes::parse_or_empty(self.attributes.as_deref())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::user_behavior::Entity")]
    Behaviors,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::user_behavior::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Behaviors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
