use std::str::FromStr;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build the app (same router as prod), but bind to an ephemeral port.
        let app = mokka_api::app::build_app().await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn as_decimal(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("expected a decimal string")).unwrap()
}

async fn create_cart(client: &reqwest::Client, base_url: &str, user_id: i64) {
    let res = client
        .post(format!("{}/users/{}/cart", base_url, user_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

/// The cached cart total is applied asynchronously by the totals projector;
/// poll briefly until it catches up.
async fn cart_total_eventually(
    client: &reqwest::Client,
    base_url: &str,
    user_id: i64,
    expected: Decimal,
) {
    for _ in 0..50 {
        let res = client
            .get(format!("{}/users/{}/cart", base_url, user_id))
            .send()
            .await
            .unwrap();

        if res.status() == StatusCode::OK {
            let cart: serde_json::Value = res.json().await.unwrap();
            if as_decimal(&cart["total_price"]) == expected {
                return;
            }
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("cart total did not converge to {expected} within timeout");
}

fn order_body() -> serde_json::Value {
    json!({
        "delivery_address": "12 Navoi street",
        "delivery_latitude": "41.31115",
        "delivery_longitude": "69.27973",
        "house_number": "12",
        "apartment_number": "17",
        "phone_number": "+998900000000",
        "payment_method": "card"
    })
}

#[tokio::test]
async fn health_check_responds() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn cart_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // No cart yet.
    let res = client
        .get(format!("{}/users/1/cart", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    create_cart(&client, &srv.base_url, 1).await;

    // A second create conflicts.
    let res = client
        .post(format!("{}/users/1/cart", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflict");

    let res = client
        .get(format!("{}/users/1/cart", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cart: serde_json::Value = res.json().await.unwrap();
    assert_eq!(cart["user_id"], 1);
    assert_eq!(as_decimal(&cart["total_price"]), dec!(0));

    let res = client
        .delete(format!("{}/users/1/cart", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/users/1/cart", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_adds_merge_and_the_cached_total_converges() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    create_cart(&client, &srv.base_url, 1).await;

    // Meal 1 ("plov") costs 5.00 in the dev menu.
    let res = client
        .post(format!("{}/users/1/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 1, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["meal_name"], "plov");
    assert_eq!(item["quantity"], 2);
    assert_eq!(as_decimal(&item["total_price"]), dec!(10.00));

    cart_total_eventually(&client, &srv.base_url, 1, dec!(10.00)).await;

    // Adding the same meal again merges into the existing line.
    let res = client
        .post(format!("{}/users/1/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 1, "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let merged: serde_json::Value = res.json().await.unwrap();
    assert_eq!(merged["id"], item["id"]);
    assert_eq!(merged["quantity"], 5);
    assert_eq!(as_decimal(&merged["total_price"]), dec!(25.00));

    let res = client
        .get(format!("{}/users/1/cart/items", srv.base_url))
        .send()
        .await
        .unwrap();
    let items: serde_json::Value = res.json().await.unwrap();
    assert_eq!(items.as_array().unwrap().len(), 1);

    // 25.00, not 35.00: the line's contribution was replaced, not re-added.
    cart_total_eventually(&client, &srv.base_url, 1, dec!(25.00)).await;
}

#[tokio::test]
async fn patching_quantity_to_zero_removes_the_item() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    create_cart(&client, &srv.base_url, 1).await;

    let res = client
        .post(format!("{}/users/1/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 1, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    let item_id = item["id"].as_i64().unwrap();

    cart_total_eventually(&client, &srv.base_url, 1, dec!(10.00)).await;

    let res = client
        .patch(format!("{}/users/1/cart/items/{}", srv.base_url, item_id))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/users/1/cart/items/{}", srv.base_url, item_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    cart_total_eventually(&client, &srv.base_url, 1, dec!(0)).await;
}

#[tokio::test]
async fn quantity_validation_is_enforced() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    create_cart(&client, &srv.base_url, 1).await;

    for quantity in [0, -1] {
        let res = client
            .post(format!("{}/users/1/cart/items", srv.base_url))
            .json(&json!({ "meal_id": 1, "quantity": quantity }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "validation_error");
    }

    let res = client
        .post(format!("{}/users/1/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 1, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    let item_id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    // Negative quantity in a patch is rejected; an empty patch too.
    let res = client
        .patch(format!("{}/users/1/cart/items/{}", srv.base_url, item_id))
        .json(&json!({ "quantity": -2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .patch(format!("{}/users/1/cart/items/{}", srv.base_url, item_id))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_cart_and_unknown_meal_are_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // No cart for user 9.
    let res = client
        .post(format!("{}/users/9/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 1, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    create_cart(&client, &srv.base_url, 9).await;

    // Meal 99 is not on the menu.
    let res = client
        .post(format!("{}/users/9/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 99, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Clearing an empty cart is a 404 as well.
    let res = client
        .delete(format!("{}/users/9/cart/items", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_placement_freezes_the_total_and_drains_the_cart() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    create_cart(&client, &srv.base_url, 1).await;

    client
        .post(format!("{}/users/1/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 1, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/users/1/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 2, "quantity": 1 }))
        .send()
        .await
        .unwrap();

    // Wait for the cached total before placing the order: the snapshot
    // freezes whatever the cache says.
    cart_total_eventually(&client, &srv.base_url, 1, dec!(14.50)).await;

    let res = client
        .post(format!("{}/users/1/orders", srv.base_url))
        .json(&order_body())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = res.json().await.unwrap();
    assert_eq!(order["user_id"], 1);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "pending");
    assert_eq!(order["payment_method"], "card");
    assert_eq!(as_decimal(&order["total_price"]), dec!(14.50));
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    // Cart is drained, and the cached total follows.
    let res = client
        .get(format!("{}/users/1/cart/items", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<serde_json::Value>().await.unwrap()
        .as_array()
        .unwrap()
        .is_empty());
    cart_total_eventually(&client, &srv.base_url, 1, dec!(0)).await;

    // Ordering again from the now-empty cart fails.
    let res = client
        .post(format!("{}/users/1/orders", srv.base_url))
        .json(&order_body())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_reads_and_deletes_have_not_found_semantics() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    create_cart(&client, &srv.base_url, 1).await;

    let res = client
        .get(format!("{}/users/1/orders", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    client
        .post(format!("{}/users/1/cart/items", srv.base_url))
        .json(&json!({ "meal_id": 3, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    let res = client
        .post(format!("{}/users/1/orders", srv.base_url))
        .json(&order_body())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order_id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let res = client
        .get(format!("{}/users/1/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Another user's namespace does not see it.
    let res = client
        .get(format!("{}/users/2/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/users/1/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .delete(format!("{}/users/1/orders", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
