use crate::{
    entities::cart,
    errors::ServiceError,
    events::{Event, EventSender},
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// One cart line: a purchase-time snapshot of the product keyed by the
/// product id. `imageUrl` keeps its storefront spelling because the map is
/// shared verbatim with clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Item map keyed by product-id string
pub type CartItemMap = BTreeMap<String, CartLineItem>;

/// Keyed cart storage. Reads of absent carts yield an empty map; writes
/// replace the whole map (last writer wins). Merge logic belongs to callers.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<CartItemMap, ServiceError>;

    async fn put(
        &self,
        session_id: &str,
        user_id: Option<i32>,
        items: CartItemMap,
    ) -> Result<CartItemMap, ServiceError>;
}

/// Drops lines with non-positive quantities so a full-map replace doubles as
/// a removal operation.
pub fn sanitize_items(items: CartItemMap) -> CartItemMap {
    items
        .into_iter()
        .filter(|(_, line)| line.quantity > 0)
        .collect()
}

/// SeaORM-backed cart store, one row per session token.
#[derive(Clone)]
pub struct DbCartStore {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DbCartStore {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }
}

#[async_trait]
impl CartStore for DbCartStore {
    #[instrument(skip(self))]
    async fn get(&self, session_id: &str) -> Result<CartItemMap, ServiceError> {
        let row = cart::Entity::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .one(&*self.db)
            .await?;

        match row {
            Some(row) => {
                let items: CartItemMap = serde_json::from_value(row.items)?;
                Ok(items)
            }
            None => Ok(CartItemMap::new()),
        }
    }

    #[instrument(skip(self, items))]
    async fn put(
        &self,
        session_id: &str,
        user_id: Option<i32>,
        items: CartItemMap,
    ) -> Result<CartItemMap, ServiceError> {
        let items = sanitize_items(items);
        let items_json = serde_json::to_value(&items)?;
        let now = Utc::now();

        let existing = cart::Entity::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .one(&*self.db)
            .await?;

        match existing {
            Some(row) => {
                let mut active: cart::ActiveModel = row.into();
                active.items = Set(items_json);
                if user_id.is_some() {
                    active.user_id = Set(user_id);
                }
                active.updated_at = Set(now);
                active.update(&*self.db).await?;
            }
            None => {
                let active = cart::ActiveModel {
                    session_id: Set(session_id.to_string()),
                    user_id: Set(user_id),
                    items: Set(items_json),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(&*self.db).await?;
            }
        }

        self.event_sender
            .send_or_log(Event::CartUpdated {
                session_id: session_id.to_string(),
            })
            .await;

        info!("Stored cart for session {}", session_id);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(id: i32, price: Decimal, quantity: i32) -> CartLineItem {
        CartLineItem {
            id,
            name: format!("Product {}", id),
            price,
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn sanitize_drops_non_positive_quantities() {
        let mut items = CartItemMap::new();
        items.insert("1".into(), line(1, dec!(10), 2));
        items.insert("2".into(), line(2, dec!(5), 0));
        items.insert("3".into(), line(3, dec!(7), -4));

        let cleaned = sanitize_items(items);
        assert_eq!(cleaned.len(), 1);
        assert!(cleaned.contains_key("1"));
    }

    #[test]
    fn sanitize_keeps_valid_map_unchanged() {
        let mut items = CartItemMap::new();
        items.insert("7".into(), line(7, dec!(100), 2));

        let cleaned = sanitize_items(items.clone());
        assert_eq!(cleaned, items);
    }

    #[test]
    fn line_item_wire_format_uses_image_url_spelling() {
        let item = CartLineItem {
            id: 7,
            name: "Dress".into(),
            price: dec!(100),
            quantity: 2,
            image_url: Some("https://cdn.example.com/dress.jpg".into()),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("image_url").is_none());
    }

    #[test]
    fn line_item_rejects_non_numeric_quantity() {
        let raw = serde_json::json!({
            "id": 7,
            "name": "Dress",
            "price": 100,
            "quantity": "two"
        });
        assert!(serde_json::from_value::<CartLineItem>(raw).is_err());
    }
}
