//! Cart and checkout flow, including the behavior events it records.

mod common;

use std::str::FromStr;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).expect("valid decimal")
}

async fn behavior_actions(app: &TestApp) -> Vec<(i64, String)> {
    let body = response_json(app.get("/user-behavior/").await).await;
    body.as_array()
        .expect("array")
        .iter()
        .map(|entry| {
            (
                entry["product"].as_i64().expect("product"),
                entry["action_type"].as_str().expect("action").to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn get_cart_creates_an_empty_cart() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ann", "ann@example.com").await;

    let response = app.get(&format!("/users/{}/cart/", user.user_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart = response_json(response).await;
    assert_eq!(cart["user"], user.user_id);
    assert_eq!(cart["items"], json!([]));

    // Same cart on the next read
    let again = response_json(app.get(&format!("/users/{}/cart/", user.user_id)).await).await;
    assert_eq!(again["cart_id"], cart["cart_id"]);
}

#[tokio::test]
async fn cart_for_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let response = app.get("/users/42/cart/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "User not found.");
}

#[tokio::test]
async fn adding_twice_increments_quantity_and_logs_each_add() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ann", "ann@example.com").await;
    let product = app.seed_product("Pen", "Office", dec!(2.50), None).await;
    let uri = format!("/users/{}/cart/add/{}/", user.user_id, product.product_id);

    assert_eq!(app.post(&uri, None).await.status(), StatusCode::OK);
    let cart = response_json(app.post(&uri, None).await).await;

    let items = cart["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["product"]["product_id"], product.product_id);
    assert_eq!(items[0]["product"]["name"], "Pen");

    let product_id = product.product_id as i64;
    assert_eq!(
        behavior_actions(&app).await,
        vec![
            (product_id, "AddToCart".to_string()),
            (product_id, "AddToCart".to_string())
        ]
    );
}

#[tokio::test]
async fn add_requires_existing_product() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ann", "ann@example.com").await;

    let response = app
        .post(&format!("/users/{}/cart/add/77/", user.user_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Product not found.");
    assert!(behavior_actions(&app).await.is_empty());
}

#[tokio::test]
async fn update_quantity_sets_or_removes_line() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ann", "ann@example.com").await;
    let product = app.seed_product("Pen", "Office", dec!(2.50), None).await;
    app.post(
        &format!("/users/{}/cart/add/{}/", user.user_id, product.product_id),
        None,
    )
    .await;
    let uri = format!("/users/{}/cart/update/{}/", user.user_id, product.product_id);

    let cart = response_json(
        app.request(Method::PUT, &uri, Some(json!({"quantity": 5})))
            .await,
    )
    .await;
    assert_eq!(cart["items"][0]["quantity"], 5);

    let response = app.request(Method::PUT, &uri, Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"], "Quantity is required.");

    let response = app
        .request(Method::PUT, &uri, Some(json!({"quantity": "lots"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["error"],
        "Quantity must be an integer."
    );

    let cart = response_json(
        app.request(Method::PUT, &uri, Some(json!({"quantity": 0})))
            .await,
    )
    .await;
    assert_eq!(cart["items"], json!([]));

    let response = app
        .request(Method::PUT, &uri, Some(json!({"quantity": 1})))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Cart item not found.");
}

#[tokio::test]
async fn remove_deletes_line() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ann", "ann@example.com").await;
    let product = app.seed_product("Pen", "Office", dec!(2.50), None).await;
    app.post(
        &format!("/users/{}/cart/add/{}/", user.user_id, product.product_id),
        None,
    )
    .await;

    let uri = format!("/users/{}/cart/remove/{}/", user.user_id, product.product_id);
    let response = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cart = response_json(app.get(&format!("/users/{}/cart/", user.user_id)).await).await;
    assert_eq!(cart["items"], json!([]));

    let response = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checkout_snapshots_prices_logs_purchases_and_clears_cart() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ann", "ann@example.com").await;
    let pen = app.seed_product("Pen", "Office", dec!(12.50), None).await;
    let pad = app.seed_product("Pad", "Office", dec!(2.25), None).await;

    for product_id in [pen.product_id, pen.product_id, pad.product_id] {
        app.post(
            &format!("/users/{}/cart/add/{}/", user.user_id, product_id),
            None,
        )
        .await;
    }

    let response = app
        .post("/orders/", Some(json!({"user": user.user_id})))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = response_json(response).await;

    assert_eq!(order["user"], user.user_id);
    assert_eq!(order["status"], "Pending");
    assert_eq!(decimal(&order["total_amount"]), dec!(27.25));

    let items = order["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["product"]["product_id"], pen.product_id);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(decimal(&items[0]["unit_price"]), dec!(12.50));
    assert_eq!(items[1]["product"]["product_id"], pad.product_id);
    assert_eq!(items[1]["quantity"], 1);

    // Later price changes do not touch the order
    let response = app
        .request(
            Method::PATCH,
            &format!("/products/{}/", pen.product_id),
            Some(json!({"price": "99.00"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored = response_json(
        app.get(&format!("/orders/{}/", order["order_id"]))
            .await,
    )
    .await;
    assert_eq!(decimal(&stored["items"][0]["unit_price"]), dec!(12.50));
    assert_eq!(decimal(&stored["total_amount"]), dec!(27.25));

    let purchases: Vec<i64> = behavior_actions(&app)
        .await
        .into_iter()
        .filter(|(_, action)| action == "Purchase")
        .map(|(product, _)| product)
        .collect();
    assert_eq!(purchases, vec![pen.product_id as i64, pad.product_id as i64]);

    let cart = response_json(app.get(&format!("/users/{}/cart/", user.user_id)).await).await;
    assert_eq!(cart["items"], json!([]));

    let orders = response_json(app.get("/orders/").await).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn checkout_without_cart_or_items_fails() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ann", "ann@example.com").await;

    let response = app
        .post("/orders/", Some(json!({"user": user.user_id})))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Cart not found.");

    app.get(&format!("/users/{}/cart/", user.user_id)).await;
    let response = app
        .post("/orders/", Some(json!({"user": user.user_id})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"], "Cart is empty.");

    let orders = response_json(app.get("/orders/").await).await;
    assert_eq!(orders, json!([]));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new().await;
    let response = app.get("/orders/5/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(response).await["error"], "Order not found.");
}

#[tokio::test]
async fn add_at_max_quantity_is_rejected() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ann", "ann@example.com").await;
    let product = app.seed_product("Pen", "Office", dec!(2.50), None).await;
    let add_uri = format!("/users/{}/cart/add/{}/", user.user_id, product.product_id);
    app.post(&add_uri, None).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/users/{}/cart/update/{}/", user.user_id, product.product_id),
            Some(json!({"quantity": i32::MAX})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.post(&add_uri, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["error"],
        "Cart item quantity is too large."
    );

    // Quantity and behavior log are unchanged
    let cart = response_json(app.get(&format!("/users/{}/cart/", user.user_id)).await).await;
    assert_eq!(cart["items"][0]["quantity"], i32::MAX);
    assert_eq!(behavior_actions(&app).await.len(), 1);
}
