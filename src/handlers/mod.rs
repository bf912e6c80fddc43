//! HTTP handlers, one module per resource

pub mod cart;
pub mod categories;
pub mod common;
pub mod orders;
pub mod payments;
pub mod products;
pub mod settings;

use crate::{
    auth::AuthService,
    config::AppConfig,
    events::EventSender,
    services::{
        carts::{CartStore, DbCartStore},
        catalog::CatalogService,
        checkout::CheckoutService,
        orders::OrderService,
        payments::{PaymentService, PaymobStub},
        settings::SettingsService,
    },
};
use axum::{extract::State, response::IntoResponse, Json};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

/// Shared service container handed to every handler through [`crate::AppState`]
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<OrderService>,
    pub checkout: Arc<CheckoutService>,
    pub payments: Arc<PaymentService>,
    pub settings: Arc<SettingsService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        auth: Arc<AuthService>,
        config: &AppConfig,
    ) -> Self {
        let settings = Arc::new(SettingsService::new(db.clone()));
        let provider = Arc::new(PaymobStub::new(Duration::from_millis(
            config.payment_stub_delay_ms,
        )));

        Self {
            catalog: Arc::new(CatalogService::new(db.clone())),
            carts: Arc::new(DbCartStore::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(db.clone(), event_sender.clone())),
            checkout: Arc::new(CheckoutService::new(
                db.clone(),
                event_sender.clone(),
                settings.clone(),
            )),
            payments: Arc::new(PaymentService::new(
                db,
                event_sender,
                provider,
                config.default_currency.clone(),
            )),
            settings,
            auth,
        }
    }
}

/// Liveness and database health probe
pub async fn health_check(State(state): State<crate::AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "database": "up" })),
        ),
        Err(err) => {
            tracing::error!("Database health check failed: {}", err);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "degraded", "database": "down" })),
            )
        }
    }
}
