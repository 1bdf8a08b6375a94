//! End-to-end checks against a running server backed by PostgreSQL.
//!
//! Start the server with `CATALOG_DATABASE__ENSURE_SCHEMA=true` and run
//! `cargo test -- --ignored`. `TEST_API_BASE_URL` defaults to
//! `http://localhost:5000`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

// Test client wrapper for making API calls
struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
    }

    async fn put(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .put(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    async fn get_from_origin(&self, path: &str, origin: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .header("Origin", origin)
            .send()
            .await
    }

    async fn delete(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .delete(&format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    async fn products(&self) -> Vec<Value> {
        let response = self.get("/products").await.expect("Failed to list products");
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("Listing is not JSON");
        body["products"].as_array().cloned().unwrap_or_default()
    }
}

async fn connect() -> TestClient {
    let base_url = std::env::var("TEST_API_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:5000".to_string());
    let client = TestClient::new(base_url);

    let max_retries = 30;
    for attempt in 0..=max_retries {
        match client.get("/health").await {
            Ok(resp) if resp.status().is_success() => return client,
            _ if attempt == max_retries => {}
            _ => sleep(Duration::from_millis(500)).await,
        }
    }
    panic!("API server is not responding after {} attempts", max_retries);
}

/// Unique per run so repeated runs don't collide on UPC or property names
fn run_tag() -> String {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .to_string()
}

fn find_by_upc<'a>(products: &'a [Value], upc: &str) -> Option<&'a Value> {
    products.iter().find(|p| p["upc"] == upc)
}

#[tokio::test]
#[ignore]
async fn test_create_and_list_with_properties() {
    let client = connect().await;
    let upc = format!("upc-{}", run_tag());

    let response = client
        .post(
            "/products",
            json!({
                "name": "Trail Bike",
                "upc": upc,
                "availableOn": "2024-06-15",
                "properties": [
                    {"propertyName": "color", "propertyValue": "red"},
                    {"propertyName": "size", "propertyValue": "M"}
                ]
            }),
        )
        .await
        .expect("Failed to create product");
    assert_eq!(response.status(), StatusCode::CREATED);

    let products = client.products().await;
    let product = find_by_upc(&products, &upc).expect("created product is listed");
    assert_eq!(product["availableon"], "06/15/2024");

    let properties = product["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 2);
    assert!(properties.contains(&json!({"propertyName": "color", "propertyValue": "red"})));
    assert!(properties.contains(&json!({"propertyName": "size", "propertyValue": "M"})));
}

#[tokio::test]
#[ignore]
async fn test_property_list_is_capped() {
    let client = connect().await;
    let tag = run_tag();
    let upc = format!("upc-cap-{}", tag);
    let properties: Vec<Value> = (0..15)
        .map(|i| json!({"propertyName": format!("cap-{}-{}", tag, i), "propertyValue": i.to_string()}))
        .collect();

    let response = client
        .post(
            "/products",
            json!({"name": "Cap", "upc": upc, "availableOn": "2024-01-01", "properties": properties}),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let products = client.products().await;
    let product = find_by_upc(&products, &upc).unwrap();
    assert_eq!(product["properties"].as_array().unwrap().len(), 10);
}

#[tokio::test]
#[ignore]
async fn test_failed_creation_is_invisible() {
    let client = connect().await;
    let tag = run_tag();
    let upc = format!("upc-fail-{}", tag);

    // The nameless second entry fails after the product and the first
    // property were already written inside the transaction.
    let response = client
        .post(
            "/products",
            json!({
                "name": "Broken",
                "upc": upc,
                "availableOn": "2024-01-01",
                "properties": [
                    {"propertyName": format!("fresh-{}", tag), "propertyValue": "1"},
                    {"propertyValue": "orphan"}
                ]
            }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "An error occurred while creating the product and properties."
    );

    let products = client.products().await;
    assert!(find_by_upc(&products, &upc).is_none());
}

#[tokio::test]
#[ignore]
async fn test_concurrent_creations_share_new_property() {
    let client = connect().await;
    let tag = run_tag();
    let property = format!("weight-{}", tag);
    let body = |upc: &str, value: &str| {
        json!({
            "name": "Scale",
            "upc": upc,
            "availableOn": "2024-01-01",
            "properties": [{"propertyName": property, "propertyValue": value}]
        })
    };
    let first_upc = format!("upc-a-{}", tag);
    let second_upc = format!("upc-b-{}", tag);

    let (first, second) = tokio::join!(
        client.post("/products", body(&first_upc, "1kg")),
        client.post("/products", body(&second_upc, "2kg")),
    );
    assert_eq!(first.unwrap().status(), StatusCode::CREATED);
    assert_eq!(second.unwrap().status(), StatusCode::CREATED);

    let products = client.products().await;
    for (upc, value) in [(&first_upc, "1kg"), (&second_upc, "2kg")] {
        let product = find_by_upc(&products, upc).unwrap();
        assert_eq!(
            product["properties"],
            json!([{"propertyName": property, "propertyValue": value}])
        );
    }
}

#[tokio::test]
#[ignore]
async fn test_opposite_order_creations_over_existing_properties() {
    let client = connect().await;
    let tag = run_tag();
    let color = format!("color-{}", tag);
    let size = format!("size-{}", tag);

    let seeded = client
        .post(
            "/products",
            json!({
                "name": "Seed",
                "upc": format!("upc-seed-{}", tag),
                "availableOn": "2024-01-01",
                "properties": [
                    {"propertyName": color, "propertyValue": "red"},
                    {"propertyName": size, "propertyValue": "M"}
                ]
            }),
        )
        .await
        .unwrap();
    assert_eq!(seeded.status(), StatusCode::CREATED);

    for i in 0..50 {
        let forward = json!({
            "name": "Forward",
            "upc": format!("upc-fwd-{}-{}", tag, i),
            "availableOn": "2024-01-01",
            "properties": [
                {"propertyName": color, "propertyValue": "blue"},
                {"propertyName": size, "propertyValue": "L"}
            ]
        });
        let backward = json!({
            "name": "Backward",
            "upc": format!("upc-bwd-{}-{}", tag, i),
            "availableOn": "2024-01-01",
            "properties": [
                {"propertyName": size, "propertyValue": "S"},
                {"propertyName": color, "propertyValue": "green"}
            ]
        });

        let (forward, backward) = tokio::join!(
            client.post("/products", forward),
            client.post("/products", backward),
        );
        assert_eq!(forward.unwrap().status(), StatusCode::CREATED, "iteration {}", i);
        assert_eq!(backward.unwrap().status(), StatusCode::CREATED, "iteration {}", i);
    }

    let products = client.products().await;
    let backward = find_by_upc(&products, &format!("upc-bwd-{}-0", tag)).unwrap();
    assert_eq!(
        backward["properties"],
        json!([
            {"propertyName": size, "propertyValue": "S"},
            {"propertyName": color, "propertyValue": "green"}
        ])
    );
}

#[tokio::test]
#[ignore]
async fn test_update_and_delete_existing_product() {
    let client = connect().await;
    let upc = format!("upc-upd-{}", run_tag());

    let created = client
        .post(
            "/products",
            json!({
                "name": "Old",
                "upc": upc,
                "availableOn": "2024-01-01",
                "properties": [{"propertyName": "finish", "propertyValue": "matte"}]
            }),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created: Value = created.json().await.unwrap();
    let id = created["id"].as_i64().expect("creation returns the product id");

    let renamed = client
        .put(&format!("/products/{}", id), json!({"name": "New"}))
        .await
        .unwrap();
    assert_eq!(renamed.status(), StatusCode::OK);
    let renamed: Value = renamed.json().await.unwrap();
    assert_eq!(renamed["id"], id);
    assert_eq!(renamed["name"], "New");
    assert_eq!(renamed["upc"], upc.as_str());
    assert_eq!(renamed["availableOn"], "2024-01-01");

    let redated = client
        .put(&format!("/products/{}", id), json!({"availableOn": "2025-03-09"}))
        .await
        .unwrap();
    assert_eq!(redated.status(), StatusCode::OK);
    let redated: Value = redated.json().await.unwrap();
    assert_eq!(redated["name"], "New");
    assert_eq!(redated["availableOn"], "2025-03-09");

    let products = client.products().await;
    let listed = find_by_upc(&products, &upc).unwrap();
    assert_eq!(listed["availableon"], "03/09/2025");

    let deleted = client.delete(&format!("/products/{}", id)).await.unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let products = client.products().await;
    assert!(find_by_upc(&products, &upc).is_none());

    let again = client.delete(&format!("/products/{}", id)).await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_missing_ids_and_origin_policy() {
    let client = connect().await;

    let missing = client.put("/products/2147483647", json!({"name": "x"})).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let rejected = client
        .get_from_origin("/products", "http://not-allowed.example")
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);

    let deleted = client.delete("/products/2147483647").await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NOT_FOUND);
}
