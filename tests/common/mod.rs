//! Shared integration test harness. Each test gets the full router wired the
//! same way as `main`, backed by a throwaway SQLite database.

#![allow(dead_code)]

use atelier_api::{
    auth::{self, AuthConfig, AuthService, RegisterInput},
    config::AppConfig,
    db,
    entities::user,
    events::EventSender,
    handlers::AppServices,
    services::{
        carts::{CartItemMap, CartLineItem},
        catalog::{CreateCategoryInput, CreateProductInput},
        settings::CreateSettingInput,
    },
    session, AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    middleware, Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

const TEST_JWT_SECRET: &str =
    "integration_test_secret_0f82b1b7c64d4e9a8d35f1a27c9b46e1d0a3758c2b91f4e6";

pub struct TestApp {
    pub router: Router,
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
    pub config: AppConfig,
    // Held so the database file outlives the test
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("atelier_test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut config = AppConfig::new(
            database_url.clone(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "development".to_string(),
        );
        // Tests should not wait on the simulated processor
        config.payment_stub_delay_ms = 0;

        let db = Arc::new(
            db::establish_connection(&database_url)
                .await
                .expect("connect to sqlite"),
        );
        db::run_migrations(&db).await.expect("run migrations");

        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(atelier_api::events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(
            AuthConfig::new(
                config.jwt_secret.clone(),
                config.auth_issuer.clone(),
                config.auth_audience.clone(),
                Duration::from_secs(config.jwt_expiration as u64),
            ),
            db.clone(),
        ));

        let services = AppServices::new(
            db.clone(),
            Arc::new(event_sender.clone()),
            auth_service.clone(),
            &config,
        );

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            event_sender,
            services: services.clone(),
        };

        let router = Router::new()
            .nest("/api", atelier_api::api_routes())
            .layer(middleware::from_fn_with_state(
                config.clone(),
                session::cart_session_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth::auth_context_middleware,
            ))
            .with_state(state);

        Self {
            router,
            db,
            services,
            auth: auth_service,
            config,
            _db_dir: db_dir,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
        token: Option<&str>,
        session: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(session) = session {
            builder = builder.header(
                header::COOKIE,
                format!("{}={}", self.config.cart_cookie_name, session),
            );
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        self.router.clone().oneshot(request).await.expect("run request")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Method::GET, uri, None, None, None).await
    }

    pub async fn get_authed(&self, uri: &str, token: &str) -> Response<Body> {
        self.request(Method::GET, uri, None, Some(token), None).await
    }

    /// Registers an account and returns its id and a bearer token
    pub async fn register_user(&self, username: &str, email: &str) -> (i32, String) {
        let account = self
            .auth
            .register(RegisterInput {
                username: username.to_string(),
                email: email.to_string(),
                password: "correct horse battery staple".to_string(),
                first_name: None,
                last_name: None,
            })
            .await
            .expect("register account");
        let token = self.auth.generate_token(&account).expect("issue token");
        (account.id, token.access_token)
    }

    /// Registers an account, promotes it to admin, and returns a fresh token
    pub async fn admin_token(&self) -> String {
        let account = self
            .auth
            .register(RegisterInput {
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password: "correct horse battery staple".to_string(),
                first_name: None,
                last_name: None,
            })
            .await
            .expect("register admin");

        let mut active = account.into_active_model();
        active.is_admin = Set(true);
        let admin: user::Model = active.update(&*self.db).await.expect("promote admin");

        self.auth
            .generate_token(&admin)
            .expect("issue admin token")
            .access_token
    }

    pub async fn seed_category(&self, name: &str, slug: &str) -> i32 {
        self.services
            .catalog
            .create_category(CreateCategoryInput {
                name: name.to_string(),
                slug: slug.to_string(),
                description: None,
                image_url: None,
            })
            .await
            .expect("seed category")
            .id
    }

    pub async fn seed_product(
        &self,
        name: &str,
        slug: &str,
        price: Decimal,
        category_id: i32,
    ) -> i32 {
        self.services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                slug: slug.to_string(),
                description: format!("{} description", name),
                price,
                sale_price: None,
                image_url: format!("https://cdn.example.com/{}.jpg", slug),
                secondary_images: None,
                category_id,
                in_stock: true,
                is_new: false,
                is_featured: false,
            })
            .await
            .expect("seed product")
            .id
    }

    pub async fn seed_setting(&self, key: &str, value: &str, group: &str) -> i32 {
        self.services
            .settings
            .create(CreateSettingInput {
                key: key.to_string(),
                value: Some(value.to_string()),
                group: group.to_string(),
                label: key.to_string(),
                setting_type: atelier_api::entities::site_setting::SettingType::Text,
            })
            .await
            .expect("seed setting")
            .id
    }
}

pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json body")
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

/// Builds a cart item map with one line per (id, price, quantity) entry
pub fn cart_items(lines: &[(i32, &str, i32)]) -> serde_json::Value {
    let map: CartItemMap = lines
        .iter()
        .map(|(id, price, quantity)| {
            (
                id.to_string(),
                CartLineItem {
                    id: *id,
                    name: format!("Product {}", id),
                    price: price.parse().expect("parse price"),
                    quantity: *quantity,
                    image_url: None,
                },
            )
        })
        .collect();
    serde_json::to_value(map).expect("serialize cart")
}

/// Parses a decimal out of a JSON string or number field
pub fn decimal_field(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => s.parse().expect("decimal string"),
        serde_json::Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal field: {:?}", other),
    }
}
