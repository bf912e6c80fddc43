use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog product. `category_id` is checked against an existing category at
/// the service layer rather than with a database constraint, so categories can
/// be reorganized without cascading through the catalog.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub sale_price: Option<Decimal>,
    pub image_url: String,
    /// JSON array of additional image URLs
    #[sea_orm(column_type = "Json", nullable)]
    pub secondary_images: Option<Json>,
    pub category_id: i32,
    pub in_stock: bool,
    pub is_new: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
