mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, response_json, TestApp};
use rust_decimal_macros::dec;

#[tokio::test]
async fn admin_routes_reject_anonymous_and_non_admin_callers() {
    let app = TestApp::spawn().await;
    let (_, customer_token) = app.register_user("nora", "nora@example.com").await;

    let body = serde_json::json!({ "name": "Dresses", "slug": "dresses" });

    let anonymous = app
        .request(
            Method::POST,
            "/api/admin/categories",
            Some(body.clone()),
            None,
            None,
        )
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let customer = app
        .request(
            Method::POST,
            "/api/admin/categories",
            Some(body),
            Some(&customer_token),
            None,
        )
        .await;
    assert_eq!(customer.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn category_crud_round_trip() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;

    let created = response_json(
        app.request(
            Method::POST,
            "/api/admin/categories",
            Some(serde_json::json!({ "name": "Dresses", "slug": "dresses" })),
            Some(&admin_token),
            None,
        )
        .await,
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let fetched = app.get("/api/categories/dresses").await;
    assert_status(&fetched, StatusCode::OK);

    let updated = response_json(
        app.request(
            Method::PUT,
            &format!("/api/admin/categories/{}", id),
            Some(serde_json::json!({ "name": "Evening Dresses" })),
            Some(&admin_token),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(updated["name"], "Evening Dresses");
    assert_eq!(updated["slug"], "dresses");

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/admin/categories/{}", id),
            None,
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = app.get("/api/categories/dresses").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_creation_requires_an_existing_category() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;

    let response = app
        .request(
            Method::POST,
            "/api/admin/products",
            Some(serde_json::json!({
                "name": "Linen Dress",
                "slug": "linen-dress",
                "description": "A dress",
                "price": "100.00",
                "image_url": "https://cdn.example.com/dress.jpg",
                "category_id": 999
            })),
            Some(&admin_token),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_listing_and_slug_lookup() {
    let app = TestApp::spawn().await;
    let category_id = app.seed_category("Dresses", "dresses").await;
    app.seed_product("Linen Dress", "linen-dress", dec!(100), category_id)
        .await;

    let list = response_json(app.get("/api/products").await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let by_slug = response_json(app.get("/api/products/linen-dress").await).await;
    assert_eq!(by_slug["name"], "Linen Dress");

    let by_category = response_json(app.get("/api/products/category/dresses").await).await;
    assert_eq!(by_category.as_array().unwrap().len(), 1);

    let missing = app.get("/api/products/no-such-dress").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let missing_category = app.get("/api/products/category/no-such-group").await;
    assert_eq!(missing_category.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn featured_and_new_filters_respect_flags() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let category_id = app.seed_category("Dresses", "dresses").await;

    app.request(
        Method::POST,
        "/api/admin/products",
        Some(serde_json::json!({
            "name": "Featured Dress",
            "slug": "featured-dress",
            "description": "A dress",
            "price": "100.00",
            "image_url": "https://cdn.example.com/a.jpg",
            "category_id": category_id,
            "is_featured": true
        })),
        Some(&admin_token),
        None,
    )
    .await;
    app.seed_product("Plain Dress", "plain-dress", dec!(50), category_id)
        .await;

    let featured = response_json(app.get("/api/products/featured").await).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);
    assert_eq!(featured[0]["slug"], "featured-dress");

    let new_arrivals = response_json(app.get("/api/products/new").await).await;
    assert!(new_arrivals.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn product_update_can_toggle_flags_and_price() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let category_id = app.seed_category("Dresses", "dresses").await;
    let product_id = app
        .seed_product("Linen Dress", "linen-dress", dec!(100), category_id)
        .await;

    let updated = response_json(
        app.request(
            Method::PUT,
            &format!("/api/admin/products/{}", product_id),
            Some(serde_json::json!({ "price": "80.00", "is_new": true })),
            Some(&admin_token),
            None,
        )
        .await,
    )
    .await;

    assert_eq!(common::decimal_field(&updated["price"]), dec!(80));
    assert_eq!(updated["is_new"], true);
    assert_eq!(updated["slug"], "linen-dress");
}

#[tokio::test]
async fn settings_crud_and_public_reads() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;

    let created = response_json(
        app.request(
            Method::POST,
            "/api/admin/settings",
            Some(serde_json::json!({
                "key": "store_name",
                "value": "Atelier",
                "group": "general",
                "label": "Store name"
            })),
            Some(&admin_token),
            None,
        )
        .await,
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["setting_type"], "text");

    let by_key = response_json(app.get("/api/settings/store_name").await).await;
    assert_eq!(by_key["value"], "Atelier");

    let group = response_json(app.get("/api/settings/group/general").await).await;
    assert_eq!(group.as_array().unwrap().len(), 1);

    let updated = response_json(
        app.request(
            Method::PUT,
            &format!("/api/admin/settings/{}", id),
            Some(serde_json::json!({ "value": "Atelier Cairo" })),
            Some(&admin_token),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(updated["value"], "Atelier Cairo");

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/admin/settings/{}", id),
            None,
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = app.get("/api/settings/store_name").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_order_listing_requires_admin() {
    let app = TestApp::spawn().await;
    let (_, customer_token) = app.register_user("nora", "nora@example.com").await;

    let response = app.get_authed("/api/admin/orders", &customer_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_token = app.admin_token().await;
    let allowed = app.get_authed("/api/admin/orders", &admin_token).await;
    assert_status(&allowed, StatusCode::OK);
}

#[tokio::test]
async fn wrongly_shaped_bodies_are_bad_requests() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;

    // Well-formed JSON with the wrong shape, not a syntax error
    let category = app
        .request(
            Method::POST,
            "/api/admin/categories",
            Some(serde_json::json!({ "name": 5, "slug": "dresses" })),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(category.status(), StatusCode::BAD_REQUEST);

    let setting = app
        .request(
            Method::POST,
            "/api/admin/settings",
            Some(serde_json::json!({ "key": "store_name" })),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(setting.status(), StatusCode::BAD_REQUEST);

    let intent = app
        .request(
            Method::POST,
            "/api/payment/paymob/create",
            Some(serde_json::json!({ "order_id": "seven" })),
            None,
            None,
        )
        .await;
    assert_eq!(intent.status(), StatusCode::BAD_REQUEST);

    let register = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(serde_json::json!({ "username": "nora" })),
            None,
            None,
        )
        .await;
    assert_eq!(register.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_slugs_conflict() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    app.seed_category("Dresses", "dresses").await;

    let response = app
        .request(
            Method::POST,
            "/api/admin/categories",
            Some(serde_json::json!({ "name": "Other", "slug": "dresses" })),
            Some(&admin_token),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
