use crate::{
    entities::site_setting::{self, SettingType},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Key under which the configurable shipping method table is stored
pub const SHIPPING_METHODS_KEY: &str = "shipping_methods";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSettingInput {
    #[validate(length(min = 1, max = 128))]
    pub key: String,
    pub value: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub group: String,
    #[validate(length(min = 1, max = 128))]
    pub label: String,
    #[serde(default = "default_setting_type")]
    pub setting_type: SettingType,
}

fn default_setting_type() -> SettingType {
    SettingType::Text
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingInput {
    pub value: Option<Option<String>>,
    pub group: Option<String>,
    pub label: Option<String>,
    pub setting_type: Option<SettingType>,
}

/// One entry of the configurable shipping method table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
}

/// Site-wide key/value content store
#[derive(Clone)]
pub struct SettingsService {
    db: Arc<DatabaseConnection>,
}

impl SettingsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<site_setting::Model>, ServiceError> {
        let settings = site_setting::Entity::find()
            .order_by_asc(site_setting::Column::Group)
            .order_by_asc(site_setting::Column::Key)
            .all(&*self.db)
            .await?;
        Ok(settings)
    }

    #[instrument(skip(self))]
    pub async fn list_group(&self, group: &str) -> Result<Vec<site_setting::Model>, ServiceError> {
        let settings = site_setting::Entity::find()
            .filter(site_setting::Column::Group.eq(group))
            .order_by_asc(site_setting::Column::Key)
            .all(&*self.db)
            .await?;
        Ok(settings)
    }

    #[instrument(skip(self))]
    pub async fn get_by_key(&self, key: &str) -> Result<site_setting::Model, ServiceError> {
        site_setting::Entity::find()
            .filter(site_setting::Column::Key.eq(key))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Setting '{}' not found", key)))
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreateSettingInput,
    ) -> Result<site_setting::Model, ServiceError> {
        input.validate()?;

        let existing = site_setting::Entity::find()
            .filter(site_setting::Column::Key.eq(&input.key))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Setting '{}' already exists",
                input.key
            )));
        }

        let active = site_setting::ActiveModel {
            key: Set(input.key.clone()),
            value: Set(input.value),
            group: Set(input.group),
            label: Set(input.label),
            setting_type: Set(input.setting_type),
            ..Default::default()
        };
        let model = active.insert(&*self.db).await?;

        info!("Created setting '{}'", model.key);
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i32,
        input: UpdateSettingInput,
    ) -> Result<site_setting::Model, ServiceError> {
        let existing = site_setting::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Setting {} not found", id)))?;

        let mut active: site_setting::ActiveModel = existing.into();
        if let Some(value) = input.value {
            active.value = Set(value);
        }
        if let Some(group) = input.group {
            active.group = Set(group);
        }
        if let Some(label) = input.label {
            active.label = Set(label);
        }
        if let Some(setting_type) = input.setting_type {
            active.setting_type = Set(setting_type);
        }
        let model = active.update(&*self.db).await?;

        info!("Updated setting '{}'", model.key);
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let existing = site_setting::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Setting {} not found", id)))?;

        site_setting::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        info!("Deleted setting '{}'", existing.key);
        Ok(())
    }

    /// Returns the admin-configured shipping methods, or an empty table when
    /// the setting is absent or unparseable. Checkout falls back to built-in
    /// rates in that case.
    #[instrument(skip(self))]
    pub async fn shipping_method_table(&self) -> Result<Vec<ShippingMethod>, ServiceError> {
        let setting = site_setting::Entity::find()
            .filter(site_setting::Column::Key.eq(SHIPPING_METHODS_KEY))
            .one(&*self.db)
            .await?;

        let Some(raw) = setting.and_then(|s| s.value) else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<ShippingMethod>>(&raw) {
            Ok(methods) => Ok(methods),
            Err(err) => {
                warn!("Ignoring malformed '{}' setting: {}", SHIPPING_METHODS_KEY, err);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn shipping_method_parses_from_json() {
        let raw = r#"[
            {"id": "standard", "name": "Standard", "price": "10.00"},
            {"id": "express", "name": "Express", "description": "2 days", "price": 15}
        ]"#;

        let methods: Vec<ShippingMethod> = serde_json::from_str(raw).unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].price, dec!(10));
        assert_eq!(methods[1].price, dec!(15));
        assert_eq!(methods[1].description.as_deref(), Some("2 days"));
    }

    #[test]
    fn create_input_rejects_empty_key() {
        let input = CreateSettingInput {
            key: "".into(),
            value: None,
            group: "general".into(),
            label: "Empty".into(),
            setting_type: SettingType::Text,
        };
        assert!(input.validate().is_err());
    }
}
