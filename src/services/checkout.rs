use crate::{
    entities::{
        cart,
        order::{self, OrderStatus, PaymentStatus},
        order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        carts::CartItemMap,
        orders::OrderWithItems,
        settings::{SettingsService, ShippingMethod},
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

pub const DEFAULT_SHIPPING_METHOD: &str = "standard";

/// Customer-supplied checkout details. Prices, totals and item lists never
/// come from the client; they are read from the stored cart and recomputed
/// server side.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceOrderInput {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    pub customer_phone: Option<String>,
    #[validate(length(min = 1, max = 1024))]
    pub shipping_address: String,
    #[serde(default = "default_shipping_method")]
    pub shipping_method: String,
}

fn default_shipping_method() -> String {
    DEFAULT_SHIPPING_METHOD.to_string()
}

/// Turns a cart into an order inside a single transaction
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    settings: Arc<SettingsService>,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            settings,
        }
    }

    /// Places an order from the session's stored cart.
    ///
    /// The cart read, order insert, item snapshot inserts and cart reset all
    /// happen in one transaction, so a failure anywhere leaves both the cart
    /// and the order tables untouched.
    #[instrument(skip(self, input))]
    pub async fn place_order(
        &self,
        session_id: &str,
        user_id: Option<i32>,
        input: PlaceOrderInput,
    ) -> Result<OrderWithItems, ServiceError> {
        input.validate()?;

        let shipping_table = self.settings.shipping_method_table().await?;

        let txn = self.db.begin().await?;

        let cart_row = cart::Entity::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .one(&txn)
            .await?;

        let items: CartItemMap = match &cart_row {
            Some(row) => serde_json::from_value(row.items.clone())?,
            None => CartItemMap::new(),
        };
        if items.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "Cannot check out an empty cart".to_string(),
            ));
        }

        let shipping = shipping_cost(&shipping_table, &input.shipping_method);
        let total = order_total(&items, shipping);

        let order_active = order::ActiveModel {
            user_id: Set(user_id),
            customer_name: Set(input.customer_name),
            customer_email: Set(input.customer_email),
            customer_phone: Set(input.customer_phone),
            shipping_address: Set(input.shipping_address),
            shipping_method: Set(Some(input.shipping_method)),
            total: Set(total),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            payment_intent_id: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let order = order_active.insert(&txn).await?;

        let mut snapshots = Vec::with_capacity(items.len());
        for line in items.values() {
            let item_active = order_item::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(line.id),
                name: Set(line.name.clone()),
                price: Set(line.price),
                quantity: Set(line.quantity),
                ..Default::default()
            };
            snapshots.push(item_active.insert(&txn).await?);
        }

        if let Some(row) = cart_row {
            let mut cart_active: cart::ActiveModel = row.into();
            cart_active.items = Set(serde_json::json!({}));
            cart_active.updated_at = Set(Utc::now());
            cart_active.update(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderPlaced(order.id))
            .await;

        info!(
            "Placed order {} ({} lines, total {})",
            order.id,
            snapshots.len(),
            order.total
        );
        Ok(OrderWithItems {
            order,
            items: snapshots,
        })
    }
}

/// Resolves the shipping cost for a method id. Admin-configured entries win;
/// unknown methods fall back to the standard rate rather than failing the
/// checkout.
pub fn shipping_cost(table: &[ShippingMethod], method: &str) -> Decimal {
    if let Some(entry) = table.iter().find(|m| m.id == method) {
        return entry.price;
    }
    match method {
        "standard" => dec!(10),
        "express" => dec!(15),
        "overnight" => dec!(25),
        _ => dec!(10),
    }
}

/// Items subtotal plus shipping
pub fn order_total(items: &CartItemMap, shipping: Decimal) -> Decimal {
    let subtotal: Decimal = items
        .values()
        .map(|line| line.price * Decimal::from(line.quantity))
        .sum();
    subtotal + shipping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::carts::CartLineItem;

    fn line(id: i32, price: Decimal, quantity: i32) -> (String, CartLineItem) {
        (
            id.to_string(),
            CartLineItem {
                id,
                name: format!("Product {}", id),
                price,
                quantity,
                image_url: None,
            },
        )
    }

    #[test]
    fn builtin_shipping_rates() {
        assert_eq!(shipping_cost(&[], "standard"), dec!(10));
        assert_eq!(shipping_cost(&[], "express"), dec!(15));
        assert_eq!(shipping_cost(&[], "overnight"), dec!(25));
    }

    #[test]
    fn unknown_method_falls_back_to_standard_rate() {
        assert_eq!(shipping_cost(&[], "carrier-pigeon"), dec!(10));
    }

    #[test]
    fn configured_table_overrides_builtin_rates() {
        let table = vec![ShippingMethod {
            id: "express".into(),
            name: "Express".into(),
            description: None,
            price: dec!(20),
        }];
        assert_eq!(shipping_cost(&table, "express"), dec!(20));
        assert_eq!(shipping_cost(&table, "standard"), dec!(10));
    }

    #[test]
    fn total_sums_lines_and_shipping() {
        let items: CartItemMap = [line(7, dec!(100), 2)].into_iter().collect();
        assert_eq!(order_total(&items, dec!(15)), dec!(215));
    }

    #[test]
    fn total_of_mixed_cart() {
        let items: CartItemMap = [line(1, dec!(49.50), 1), line(2, dec!(12.25), 3)]
            .into_iter()
            .collect();
        assert_eq!(order_total(&items, dec!(10)), dec!(96.25));
    }

    #[test]
    fn place_order_input_requires_address() {
        let input = PlaceOrderInput {
            customer_name: "Nora".into(),
            customer_email: "nora@example.com".into(),
            customer_phone: None,
            shipping_address: "".into(),
            shipping_method: "standard".into(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn shipping_method_defaults_to_standard() {
        let raw = serde_json::json!({
            "customer_name": "Nora",
            "customer_email": "nora@example.com",
            "shipping_address": "12 Nile St, Cairo"
        });
        let input: PlaceOrderInput = serde_json::from_value(raw).unwrap();
        assert_eq!(input.shipping_method, DEFAULT_SHIPPING_METHOD);
    }
}
