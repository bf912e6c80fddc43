use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key/value content entry grouped for the admin UI. The `shipping_methods`
/// key (group `shipping`, type `json`) feeds the checkout shipping table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "site_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub key: String,
    #[sea_orm(nullable)]
    pub value: Option<String>,
    pub group: String,
    pub label: String,
    #[sea_orm(column_name = "type")]
    pub setting_type: SettingType,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Rendering hint for admin setting editors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "textarea")]
    Textarea,
    #[sea_orm(string_value = "url")]
    Url,
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "json")]
    Json,
    #[sea_orm(string_value = "image")]
    Image,
}
