use crate::{
    entities::{category, product},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

const DEFAULT_NEW_ARRIVALS_LIMIT: u64 = 8;
const DEFAULT_FEATURED_LIMIT: u64 = 6;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 128))]
    pub slug: String,
    pub description: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    #[validate(url)]
    pub image_url: String,
    pub secondary_images: Option<serde_json::Value>,
    pub category_id: i32,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Option<Decimal>>,
    pub image_url: Option<String>,
    pub secondary_images: Option<Option<serde_json::Value>>,
    pub category_id: Option<i32>,
    pub in_stock: Option<bool>,
    pub is_new: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Category and product catalog queries plus admin CRUD
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<category::Model, ServiceError> {
        category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))
    }

    #[instrument(skip(self, input))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;

        let existing = category::Entity::find()
            .filter(category::Column::Slug.eq(&input.slug))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category slug '{}' already exists",
                input.slug
            )));
        }

        let active = category::ActiveModel {
            name: Set(input.name),
            slug: Set(input.slug),
            description: Set(input.description),
            image_url: Set(input.image_url),
            ..Default::default()
        };
        let model = active.insert(&*self.db).await?;

        info!("Created category '{}'", model.slug);
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        id: i32,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;

        let existing = category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))?;

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(image_url);
        }
        let model = active.update(&*self.db).await?;

        info!("Updated category '{}'", model.slug);
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<(), ServiceError> {
        let existing = category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))?;

        category::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        info!("Deleted category '{}'", existing.slug);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn new_arrivals(
        &self,
        limit: Option<u64>,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsNew.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .limit(limit.unwrap_or(DEFAULT_NEW_ARRIVALS_LIMIT))
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn featured(&self, limit: Option<u64>) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsFeatured.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .limit(limit.unwrap_or(DEFAULT_FEATURED_LIMIT))
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn products_by_category_slug(
        &self,
        slug: &str,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let category = self.get_category_by_slug(slug).await?;

        let products = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category.id))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<product::Model, ServiceError> {
        product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        self.ensure_category_exists(input.category_id).await?;

        let existing = product::Entity::find()
            .filter(product::Column::Slug.eq(&input.slug))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product slug '{}' already exists",
                input.slug
            )));
        }

        let active = product::ActiveModel {
            name: Set(input.name),
            slug: Set(input.slug),
            description: Set(input.description),
            price: Set(input.price),
            sale_price: Set(input.sale_price),
            image_url: Set(input.image_url),
            secondary_images: Set(input.secondary_images),
            category_id: Set(input.category_id),
            in_stock: Set(input.in_stock),
            is_new: Set(input.is_new),
            is_featured: Set(input.is_featured),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        let model = active.insert(&*self.db).await?;

        info!("Created product '{}'", model.slug);
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: i32,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let existing = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(sale_price) = input.sale_price {
            active.sale_price = Set(sale_price);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(secondary_images) = input.secondary_images {
            active.secondary_images = Set(secondary_images);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(in_stock) = input.in_stock {
            active.in_stock = Set(in_stock);
        }
        if let Some(is_new) = input.is_new {
            active.is_new = Set(is_new);
        }
        if let Some(is_featured) = input.is_featured {
            active.is_featured = Set(is_featured);
        }
        let model = active.update(&*self.db).await?;

        info!("Updated product '{}'", model.slug);
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let existing = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        product::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        info!("Deleted product '{}'", existing.slug);
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: i32) -> Result<(), ServiceError> {
        let exists = category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .is_some();
        if !exists {
            return Err(ServiceError::InvalidInput(format!(
                "Category {} does not exist",
                category_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn create_product_input_defaults() {
        let raw = serde_json::json!({
            "name": "Linen Dress",
            "slug": "linen-dress",
            "description": "A dress",
            "price": "100.00",
            "image_url": "https://cdn.example.com/dress.jpg",
            "category_id": 1
        });

        let input: CreateProductInput = serde_json::from_value(raw).unwrap();
        assert!(input.in_stock);
        assert!(!input.is_new);
        assert!(!input.is_featured);
        assert_eq!(input.price, dec!(100));
    }

    #[test]
    fn create_category_input_rejects_bad_image_url() {
        let input = CreateCategoryInput {
            name: "Dresses".into(),
            slug: "dresses".into(),
            description: None,
            image_url: Some("not a url".into()),
        };
        assert!(input.validate().is_err());
    }
}
