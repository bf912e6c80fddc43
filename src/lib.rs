//! Storefront and admin backend for the Atelier shop.
//!
//! Public catalog browsing, a cookie-session cart, transactional checkout,
//! stubbed Paymob payments, guest order tracking, and an admin surface for
//! catalog, orders and site settings.

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;
pub mod session;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::{config::AppConfig, events::EventSender, handlers::AppServices};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub services: AppServices,
}

/// Routes mounted under `/api`.
///
/// Admin mutations live under `/api/admin` behind the admin gate; everything
/// else is public or enforces ownership per handler.
pub fn api_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/categories", post(handlers::categories::create_category))
        .route(
            "/categories/{id}",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route("/products", post(handlers::products::create_product))
        .route(
            "/products/{id}",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route("/orders", get(handlers::orders::list_all_orders))
        .route(
            "/orders/{id}/status",
            put(handlers::orders::update_order_status),
        )
        .route("/settings", post(handlers::settings::create_setting))
        .route(
            "/settings/{id}",
            put(handlers::settings::update_setting).delete(handlers::settings::delete_setting),
        )
        .layer(middleware::from_fn(auth::require_admin));

    Router::new()
        .route("/categories", get(handlers::categories::list_categories))
        .route("/categories/{slug}", get(handlers::categories::get_category))
        .route("/products", get(handlers::products::list_products))
        .route("/products/new", get(handlers::products::new_arrivals))
        .route(
            "/products/featured",
            get(handlers::products::featured_products),
        )
        .route(
            "/products/category/{slug}",
            get(handlers::products::products_by_category),
        )
        .route("/products/{slug}", get(handlers::products::get_product))
        .route(
            "/cart",
            get(handlers::cart::get_cart).post(handlers::cart::replace_cart),
        )
        .route(
            "/orders",
            get(handlers::orders::list_my_orders).post(handlers::orders::place_order),
        )
        .route("/orders/track", post(handlers::orders::track_order))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route(
            "/payment/paymob/create",
            post(handlers::payments::create_paymob_intent),
        )
        .route(
            "/payment/paymob/confirm",
            post(handlers::payments::confirm_paymob_intent),
        )
        .route("/settings", get(handlers::settings::list_settings))
        .route(
            "/settings/group/{group}",
            get(handlers::settings::list_settings_group),
        )
        .route("/settings/{key}", get(handlers::settings::get_setting))
        .nest("/admin", admin)
        .merge(auth::auth_routes())
}
