//! JSON API tests against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`furnish-cli migrate`)
//! - The demo catalog (`furnish-cli seed catalog`)
//! - The storefront running (`cargo run -p furnish-storefront`)
//!
//! Run with: `cargo test -p furnish-integration-tests -- --ignored`

use furnish_integration_tests::storefront_base_url;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use uuid::Uuid;

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

fn shipping_address(email: &str) -> Value {
    json!({
        "first_name": "Test",
        "last_name": "Shopper",
        "email": email,
        "phone": "+1 555 123 4567",
        "address": "1 Test Street",
        "city": "Springfield",
        "state": "IL",
        "zip_code": "62701",
        "country": "US"
    })
}

/// Register a fresh shopper and return `(email, bearer token)`.
async fn register_and_login(client: &Client) -> (String, String) {
    let base_url = storefront_base_url();
    let suffix = Uuid::new_v4().simple().to_string();
    let email = format!("shopper-{suffix}@example.com");
    let username = format!("shopper_{}", suffix.chars().take(12).collect::<String>());

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&json!({
            "username": username,
            "email": email,
            "first_name": "Test",
            "last_name": "Shopper",
            "password": "hunter22",
            "confirm_password": "hunter22"
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base_url}/api/auth/login"))
        .json(&json!({ "email": email, "password": "hunter22" }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse login response");
    let token = body["token"]
        .as_str()
        .expect("login response has a token")
        .to_string();
    (email, token)
}

/// First seeded product with stock, as its numeric ID.
async fn product_in_stock(client: &Client) -> i64 {
    let base_url = storefront_base_url();
    let body: Value = client
        .get(format!("{base_url}/api/products"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse product list");

    body["products"]
        .as_array()
        .expect("products array")
        .iter()
        .find(|p| p["stock_quantity"].as_i64().unwrap_or(0) > 0)
        .and_then(|p| p["id"].as_i64())
        .expect("a product in stock; run `furnish-cli seed catalog`")
}

/// A money field from a response body.
fn money(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("money is sent as a string")
        .parse()
        .expect("money parses as a decimal")
}

async fn current_balance(client: &Client, token: &str) -> Decimal {
    let base_url = storefront_base_url();
    let body: Value = client
        .get(format!("{base_url}/api/balance"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to get balance")
        .json()
        .await
        .expect("Failed to parse balance");
    money(&body["balance"])
}

async fn cart_count(client: &Client, token: &str) -> i64 {
    let base_url = storefront_base_url();
    let body: Value = client
        .get(format!("{base_url}/api/cart"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse cart");
    body["count"].as_i64().expect("cart count")
}

/// A product and quantity whose subtotal is more than `budget`.
async fn order_over_budget(client: &Client, budget: Decimal) -> (i64, i64) {
    let base_url = storefront_base_url();
    let body: Value = client
        .get(format!("{base_url}/api/products"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse product list");

    body["products"]
        .as_array()
        .expect("products array")
        .iter()
        .find_map(|p| {
            let price = money(&p["price"]);
            if price <= Decimal::ZERO {
                return None;
            }
            let quantity = (budget / price).floor().to_i64()? + 1;
            let stock = p["stock_quantity"].as_i64()?;
            (quantity <= stock).then_some((p["id"].as_i64()?, quantity))
        })
        .expect("a product with enough stock to exceed the balance")
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_health_endpoints() {
    let base_url = storefront_base_url();
    let client = client();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to get health");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to get readiness");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_catalog_listing() {
    let base_url = storefront_base_url();
    let client = client();

    let body: Value = client
        .get(format!("{base_url}/api/categories"))
        .send()
        .await
        .expect("Failed to get categories")
        .json()
        .await
        .expect("Failed to parse categories");
    assert!(!body["categories"].as_array().expect("categories").is_empty());

    let resp = client
        .get(format!("{base_url}/api/products/999999999"))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_cart_requires_authentication() {
    let base_url = storefront_base_url();

    let resp = client()
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_profile_with_bearer_token() {
    let base_url = storefront_base_url();
    // No cookie jar, so only the bearer token authenticates
    let client = Client::new();
    let (email, token) = register_and_login(&client).await;

    let body: Value = client
        .get(format!("{base_url}/api/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to get profile")
        .json()
        .await
        .expect("Failed to parse profile");
    assert_eq!(body["user"]["email"], email.as_str());

    let resp = client
        .post(format!("{base_url}/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/api/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_cart_to_order() {
    let base_url = storefront_base_url();
    let client = Client::new();
    let (email, token) = register_and_login(&client).await;
    let product_id = product_in_stock(&client).await;

    let resp = client
        .post(format!("{base_url}/api/cart/add"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["count"], 1);
    let balance_before = current_balance(&client, &token).await;

    let resp = client
        .post(format!("{base_url}/api/checkout"))
        .bearer_auth(&token)
        .json(&json!({
            "shipping_address": shipping_address(&email),
            "payment_method": "paypal",
            "promo_code": "SAVE10"
        }))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse order");
    assert!(
        body["order_number"]
            .as_str()
            .expect("order number")
            .starts_with("ORD-")
    );

    let new_balance = money(&body["new_balance"]);
    assert_eq!(new_balance, balance_before - money(&body["total"]));
    assert_eq!(current_balance(&client, &token).await, new_balance);
    assert_eq!(cart_count(&client, &token).await, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_over_balance_changes_nothing() {
    let base_url = storefront_base_url();
    let client = Client::new();
    let (email, token) = register_and_login(&client).await;
    let balance = current_balance(&client, &token).await;
    let (product_id, quantity) = order_over_budget(&client, balance).await;

    let resp = client
        .post(format!("{base_url}/api/cart/add"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": product_id, "quantity": quantity }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let count_before = cart_count(&client, &token).await;
    assert_eq!(count_before, quantity);

    let resp = client
        .post(format!("{base_url}/api/checkout"))
        .bearer_auth(&token)
        .json(&json!({
            "shipping_address": shipping_address(&email),
            "payment_method": "paypal"
        }))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("Failed to parse error");
    assert!(body["error"].is_string());
    let required = money(&body["required"]);
    let available = money(&body["available"]);
    assert_eq!(available, balance);
    assert!(required > available);
    assert_eq!(money(&body["shortage"]), required - available);

    assert_eq!(cart_count(&client, &token).await, count_before);
    assert_eq!(current_balance(&client, &token).await, balance);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_rejects_bad_requests() {
    let base_url = storefront_base_url();
    let client = Client::new();
    let (email, token) = register_and_login(&client).await;

    let resp = client
        .post(format!("{base_url}/api/checkout"))
        .bearer_auth(&token)
        .json(&json!({ "payment_method": "card" }))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "Missing required field: shipping_address");

    let resp = client
        .post(format!("{base_url}/api/checkout"))
        .bearer_auth(&token)
        .json(&json!({
            "shipping_address": shipping_address(&email),
            "payment_method": "card",
            "promo_code": "NOPE"
        }))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
