use crate::{
    auth::AuthUser,
    entities::{
        order::{self, OrderStatus, PaymentStatus},
        order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Order header plus its immutable line snapshots
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Order lookup, listing, tracking and status administration
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<OrderWithItems, ServiceError> {
        let order = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        self.with_items(order).await
    }

    /// Fetches an order enforcing ownership: admins see everything, customers
    /// only their own orders. Missing orders report 404 before ownership is
    /// considered.
    #[instrument(skip(self, user))]
    pub async fn get_order_authorized(
        &self,
        user: &AuthUser,
        id: i32,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = self.get_order(id).await?;

        if !user.is_admin && order.order.user_id != Some(user.id) {
            return Err(ServiceError::Forbidden(
                "You do not have access to this order".to_string(),
            ));
        }
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<order::Model>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(orders)
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<order::Model>, ServiceError> {
        let orders = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(orders)
    }

    /// Partial status update. Omitting `payment_status` leaves the recorded
    /// payment state untouched, so cancelling a paid order keeps it `paid`
    /// until a refund is recorded explicitly.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<order::Model, ServiceError> {
        let existing = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        let old_status = existing.status;

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(status);
        if let Some(payment_status) = payment_status {
            active.payment_status = Set(payment_status);
        }
        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: model.id,
                old_status: format!("{:?}", old_status).to_lowercase(),
                new_status: format!("{:?}", model.status).to_lowercase(),
            })
            .await;

        info!("Order {} moved to {:?}", model.id, model.status);
        Ok(model)
    }

    /// Guest order tracking by id plus email. The email comparison is
    /// case-insensitive; a wrong email on an existing order is a 403, never a
    /// 404, so probing cannot distinguish the two by flipping case.
    #[instrument(skip(self, email))]
    pub async fn track(&self, order_id: i32, email: &str) -> Result<OrderWithItems, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if !order.customer_email.eq_ignore_ascii_case(email.trim()) {
            return Err(ServiceError::Forbidden(
                "Email does not match this order".to_string(),
            ));
        }

        self.with_items(order).await
    }

    async fn with_items(&self, order: order::Model) -> Result<OrderWithItems, ServiceError> {
        let items = load_items(&*self.db, order.id).await?;
        Ok(OrderWithItems { order, items })
    }
}

/// Loads an order's item snapshots over any connection, including an open
/// transaction.
pub async fn load_items<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Vec<order_item::Model>, ServiceError> {
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sample_order(user_id: Option<i32>) -> order::Model {
        order::Model {
            id: 1,
            user_id,
            customer_name: "Nora".into(),
            customer_email: "Nora@Example.com".into(),
            customer_phone: None,
            shipping_address: "12 Nile St, Cairo".into(),
            shipping_method: Some("express".into()),
            total: dec!(215),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_intent_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn order_with_items_flattens_header_fields() {
        let payload = OrderWithItems {
            order: sample_order(Some(5)),
            items: vec![],
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["customer_name"], "Nora");
        assert_eq!(json["status"], "pending");
        assert!(json["items"].as_array().unwrap().is_empty());
        assert!(json.get("order").is_none());
    }

    #[test]
    fn tracking_email_comparison_ignores_case() {
        let order = sample_order(None);
        assert!(order
            .customer_email
            .eq_ignore_ascii_case("nora@example.com"));
        assert!(!order.customer_email.eq_ignore_ascii_case("other@example.com"));
    }
}
