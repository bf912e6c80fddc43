use crate::{
    entities::order::{self, OrderStatus, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

const INTENT_ID_PREFIX: &str = "pi_";
const INTENT_ID_SUFFIX_LEN: usize = 16;

/// Provider-side payment intent
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub order_id: i32,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub intent_id: String,
    pub status: String,
}

/// Gateway abstraction. Implementations own the wire exchange with the
/// processor; order bookkeeping stays in [`PaymentService`].
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_intent(
        &self,
        order_id: i32,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, ServiceError>;

    async fn confirm_intent(&self, intent_id: &str)
        -> Result<PaymentConfirmation, ServiceError>;
}

/// Stand-in for the Paymob gateway. Mints well-formed intent ids, simulates
/// processor latency on confirmation and approves every payment.
pub struct PaymobStub {
    processing_delay: Duration,
}

impl PaymobStub {
    pub fn new(processing_delay: Duration) -> Self {
        Self { processing_delay }
    }
}

#[async_trait]
impl PaymentProvider for PaymobStub {
    fn name(&self) -> &'static str {
        "paymob"
    }

    async fn create_intent(
        &self,
        order_id: i32,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, ServiceError> {
        let suffix: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(INTENT_ID_SUFFIX_LEN)
            .map(char::from)
            .collect();

        Ok(PaymentIntent {
            id: format!("{}{}", INTENT_ID_PREFIX, suffix),
            order_id,
            amount,
            currency: currency.to_string(),
            status: "requires_confirmation".to_string(),
        })
    }

    async fn confirm_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentConfirmation, ServiceError> {
        if !intent_id.starts_with(INTENT_ID_PREFIX) {
            return Err(ServiceError::PaymentFailed(format!(
                "Unknown payment intent '{}'",
                intent_id
            )));
        }

        tokio::time::sleep(self.processing_delay).await;

        Ok(PaymentConfirmation {
            intent_id: intent_id.to_string(),
            status: "succeeded".to_string(),
        })
    }
}

/// Payment orchestration over a pluggable provider
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    provider: Arc<dyn PaymentProvider>,
    currency: String,
}

impl PaymentService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        provider: Arc<dyn PaymentProvider>,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            provider,
            currency,
        }
    }

    /// Creates an intent for an order's stored total. The client never
    /// supplies the amount.
    #[instrument(skip(self))]
    pub async fn create_intent(&self, order_id: i32) -> Result<PaymentIntent, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let intent = self
            .provider
            .create_intent(order.id, order.total, &self.currency)
            .await?;

        let mut active: order::ActiveModel = order.into();
        active.payment_intent_id = Set(Some(intent.id.clone()));
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PaymentIntentCreated {
                order_id,
                intent_id: intent.id.clone(),
            })
            .await;

        info!(
            "Created {} intent {} for order {}",
            self.provider.name(),
            intent.id,
            order_id
        );
        Ok(intent)
    }

    /// Confirms a previously created intent and marks the order paid and
    /// processing.
    #[instrument(skip(self))]
    pub async fn confirm(
        &self,
        intent_id: &str,
        order_id: i32,
    ) -> Result<order::Model, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.payment_intent_id.as_deref() != Some(intent_id) {
            return Err(ServiceError::InvalidOperation(format!(
                "Intent '{}' does not belong to order {}",
                intent_id, order_id
            )));
        }

        self.provider.confirm_intent(intent_id).await?;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Processing);
        active.payment_status = Set(PaymentStatus::Paid);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PaymentCaptured(order_id))
            .await;

        info!("Captured payment for order {}", order_id);
        Ok(updated)
    }
}
