use chrono::{Duration as ChronoDuration, Utc};
use couture_auth::{JwtClaims, PrincipalId, Role};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = couture_api::app::build_app(JWT_SECRET.to_string()).await;
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

fn mint_admin_jwt() -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        roles: vec![Role::new("admin")],
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn new_session() -> String {
    Uuid::now_v7().to_string()
}

/// Find a seeded product by title fragment via the public catalog listing.
async fn find_product(client: &reqwest::Client, base_url: &str, fragment: &str) -> (String, u64) {
    let body: serde_json::Value = client
        .get(format!("{base_url}/api/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let product = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["title"].as_str().unwrap().contains(fragment))
        .unwrap_or_else(|| panic!("no seeded product matching {fragment:?}"));

    (
        product["id"].as_str().unwrap().to_string(),
        product["unit_price"].as_u64().unwrap(),
    )
}

fn checkout_body(product_id: &str, quantity: u32, payment: serde_json::Value) -> serde_json::Value {
    json!({
        "items": [{"product_id": product_id, "quantity": quantity}],
        "customer": {
            "name": "Ayesha Khan",
            "email": "ayesha@example.com",
            "phone": "+92 300 1234567"
        },
        "shipping_address": {
            "line1": "14-B Gulberg III",
            "city": "Lahore",
            "province": "Punjab"
        },
        "payment": payment
    })
}

fn bank_transfer_payment() -> serde_json::Value {
    json!({
        "method": "bank-transfer",
        "transaction_id": "TXN-778812",
        "receipt_reference": "receipts/txn-778812.jpg"
    })
}

/// Place a standard order and return `(order_id, order_number)`.
async fn place_order(client: &reqwest::Client, base_url: &str) -> (String, String) {
    let (product_id, _) = find_product(client, base_url, "lawn").await;
    let res = client
        .post(format!("{base_url}/api/orders"))
        .json(&checkout_body(&product_id, 2, bank_transfer_payment()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    (
        body["order"]["order_id"].as_str().unwrap().to_string(),
        body["order"]["order_number"].as_str().unwrap().to_string(),
    )
}

/// The query side is eventually consistent (command path vs projection
/// update over the bus); poll the admin view until the predicate holds.
async fn admin_order_eventually(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    order_id: &str,
    pred: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    for _ in 0..100 {
        let res = client
            .get(format!("{base_url}/api/v1/admin/orders/{order_id}"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();

        if res.status() == StatusCode::OK {
            let body: serde_json::Value = res.json().await.unwrap();
            if pred(&body["order"]) {
                return body["order"].clone();
            }
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("order {order_id} did not reach the expected projection state");
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/admin/orders", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Auth rejections use the same error body shape as every other error.
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(!body["message"].as_str().unwrap().is_empty());

    let res = client
        .get(format!("{}/api/v1/admin/orders", srv.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn cart_totals_follow_the_canonical_formula() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let session = new_session();

    let (product_id, unit_price) = find_product(&client, &srv.base_url, "lawn").await;
    assert_eq!(unit_price, 5_000);

    let res = client
        .post(format!("{}/api/cart/add", srv.base_url))
        .header("x-session-id", &session)
        .json(&json!({"product_id": product_id, "quantity": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    let totals = &body["cart"]["totals"];
    assert_eq!(totals["subtotal"], json!(10_000));
    assert_eq!(totals["tax"], json!(500));
    assert_eq!(totals["shipping"], json!(0));
    assert_eq!(totals["discount"], json!(0));
    assert_eq!(totals["total"], json!(10_500));
}

#[tokio::test]
async fn promo_code_discount_recomputes_the_total() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let session = new_session();

    let (product_id, _) = find_product(&client, &srv.base_url, "lawn").await;

    client
        .post(format!("{}/api/cart/add", srv.base_url))
        .header("x-session-id", &session)
        .json(&json!({"product_id": product_id, "quantity": 2}))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/api/cart/promo", srv.base_url))
        .header("x-session-id", &session)
        .json(&json!({"code": "TEST10"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    let totals = &body["cart"]["totals"];
    // 10% of 10000 off; total = max(0, 10000 + 500 - 1000) + 0.
    assert_eq!(totals["discount"], json!(1_000));
    assert_eq!(totals["total"], json!(9_500));
}

#[tokio::test]
async fn unknown_promo_code_leaves_the_cart_unchanged() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let session = new_session();

    let (product_id, _) = find_product(&client, &srv.base_url, "lawn").await;
    client
        .post(format!("{}/api/cart/add", srv.base_url))
        .header("x-session-id", &session)
        .json(&json!({"product_id": product_id, "quantity": 1}))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/api/cart/promo", srv.base_url))
        .header("x-session-id", &session)
        .json(&json!({"code": "NOPE99"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let cart: serde_json::Value = client
        .get(format!("{}/api/cart", srv.base_url))
        .header("x-session-id", &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["cart"]["totals"]["discount"], json!(0));
    assert!(cart["cart"]["promo"].is_null());
}

#[tokio::test]
async fn cod_order_without_receipt_reference_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (product_id, _) = find_product(&client, &srv.base_url, "lawn").await;
    let payment = json!({"method": "cod", "advance_amount": 2_500});

    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .json(&checkout_body(&product_id, 1, payment))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(
        body["message"].as_str().unwrap().contains("receipt"),
        "message should name the missing receipt: {body}"
    );
}

#[tokio::test]
async fn status_update_is_blocked_until_payment_is_verified() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_admin_jwt();

    let (order_id, _) = place_order(&client, &srv.base_url).await;

    let res = client
        .put(format!(
            "{}/api/v1/admin/orders/{order_id}/status",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"status": "in-progress"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(
        body["message"].as_str().unwrap().contains("payment"),
        "gate message should mention payment: {body}"
    );
}

#[tokio::test]
async fn tracking_an_unknown_order_number_is_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/api/orders/track/LC-2024-INVALID",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn verified_order_progresses_and_tracking_shows_the_timeline() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_admin_jwt();

    let (order_id, order_number) = place_order(&client, &srv.base_url).await;

    let res = client
        .post(format!(
            "{}/api/v1/admin/orders/{order_id}/verify-payment",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"verified": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    for status in ["material-arranged", "in-progress", "quality-check"] {
        let res = client
            .put(format!(
                "{}/api/v1/admin/orders/{order_id}/status",
                srv.base_url
            ))
            .bearer_auth(&token)
            .json(&json!({"status": status}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "moving to {status}");
    }

    admin_order_eventually(&client, &srv.base_url, &token, &order_id, |o| {
        o["status"] == json!("quality-check")
    })
    .await;

    let res = client
        .get(format!(
            "{}/api/orders/track/{order_number}",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["order_number"], json!(order_number));
    assert_eq!(body["current_status"], json!("quality-check"));
    // pending-payment, payment-verified, then the three production steps.
    assert_eq!(body["timeline"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn backward_transition_needs_an_override() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_admin_jwt();

    let (order_id, _) = place_order(&client, &srv.base_url).await;
    client
        .post(format!(
            "{}/api/v1/admin/orders/{order_id}/verify-payment",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"verified": true}))
        .send()
        .await
        .unwrap();
    client
        .put(format!(
            "{}/api/v1/admin/orders/{order_id}/status",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"status": "in-progress"}))
        .send()
        .await
        .unwrap();

    // Backward without an override: refused by the state machine.
    let res = client
        .put(format!(
            "{}/api/v1/admin/orders/{order_id}/status",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"status": "material-arranged"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Same move with an override reason: accepted and audited.
    let res = client
        .put(format!(
            "{}/api/v1/admin/orders/{order_id}/status",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"status": "material-arranged", "override": "fabric lot recalled"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let order = admin_order_eventually(&client, &srv.base_url, &token, &order_id, |o| {
        o["status"] == json!("material-arranged")
    })
    .await;
    let last_note = order["history"]
        .as_array()
        .unwrap()
        .last()
        .unwrap()["note"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(last_note.contains("override: fabric lot recalled"));
}

#[tokio::test]
async fn mismatched_receipt_amount_verifies_with_a_warning_note() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_admin_jwt();

    let (order_id, _) = place_order(&client, &srv.base_url).await;

    // Receipt reads less than the order total; verification still goes
    // through and the discrepancy lands in the audit trail.
    let res = client
        .post(format!(
            "{}/api/v1/admin/orders/{order_id}/verify-payment",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"verified": true, "amount": 100}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let order = admin_order_eventually(&client, &srv.base_url, &token, &order_id, |o| {
        o["status"] == json!("payment-verified")
    })
    .await;

    let notes: Vec<String> = order["history"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|h| h["note"].as_str().map(String::from))
        .collect();
    assert!(
        notes.iter().any(|n| n.contains("differs")),
        "expected a mismatch warning note, got {notes:?}"
    );
}

#[tokio::test]
async fn double_approval_is_idempotent() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_admin_jwt();

    let (order_id, _) = place_order(&client, &srv.base_url).await;

    let first: serde_json::Value = client
        .post(format!(
            "{}/api/v1/admin/orders/{order_id}/verify-payment",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"verified": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["events_committed"], json!(1));

    let second_res = client
        .post(format!(
            "{}/api/v1/admin/orders/{order_id}/verify-payment",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"verified": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(second_res.status(), StatusCode::OK);
    let second: serde_json::Value = second_res.json().await.unwrap();
    assert_eq!(second["events_committed"], json!(0));
}

#[tokio::test]
async fn rejected_payment_keeps_the_order_pending_and_allows_reverify() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_admin_jwt();

    let (order_id, _) = place_order(&client, &srv.base_url).await;

    let res = client
        .post(format!(
            "{}/api/v1/admin/orders/{order_id}/verify-payment",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"verified": false, "verification_notes": "receipt image unreadable"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let order = admin_order_eventually(&client, &srv.base_url, &token, &order_id, |o| {
        o["payment"]["status"] == json!("failed")
    })
    .await;
    assert_eq!(order["status"], json!("pending-payment"));

    // The customer resubmits a readable receipt; approval still works.
    let res = client
        .post(format!(
            "{}/api/v1/admin/orders/{order_id}/verify-payment",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({"verified": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn oversell_is_refused_at_order_creation() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Seeded with 3 on hand.
    let (product_id, _) = find_product(&client, &srv.base_url, "lehenga").await;

    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .json(&checkout_body(&product_id, 2, bank_transfer_payment()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .json(&checkout_body(&product_id, 2, bank_transfer_payment()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("stock"));
}

#[tokio::test]
async fn rejected_checkout_does_not_consume_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Seeded with 3 on hand.
    let (product_id, _) = find_product(&client, &srv.base_url, "lehenga").await;

    // COD without advance payment fails order validation after the
    // stock check has already passed.
    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .json(&checkout_body(&product_id, 3, json!({"method": "cod"})))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The failed attempt must leave all three units on the shelf.
    let res = client
        .post(format!("{}/api/orders", srv.base_url))
        .json(&checkout_body(&product_id, 3, bank_transfer_payment()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn custom_estimate_preview_matches_the_stored_price() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let selection = json!({
        "service_type": "premium",
        "fabric_source": "platform",
        "selected_fabric": {"name": "Crimson raw silk", "price": 2_000},
        "rush_order": true,
        "design_idea": "Ankle-length angrakha with dabka work on the bodice"
    });

    let preview: serde_json::Value = client
        .post(format!("{}/api/v1/orders/custom/estimate", srv.base_url))
        .json(&selection)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // 4500 base + 2000 fabric + 1500 rush; the brief is under the
    // complexity threshold.
    assert_eq!(preview["estimated_price"], json!(8_000));

    let mut order_body = selection.clone();
    order_body["customer"] = json!({
        "name": "Ayesha Khan",
        "email": "ayesha@example.com",
        "phone": "+92 300 1234567"
    });
    order_body["shipping_address"] = json!({
        "line1": "14-B Gulberg III",
        "city": "Karachi",
        "province": "Sindh"
    });
    order_body["payment"] = json!({
        "method": "jazzcash",
        "transaction_id": "JC-5521",
        "receipt_reference": "receipts/jc-5521.jpg"
    });

    let res = client
        .post(format!("{}/api/v1/orders/custom", srv.base_url))
        .json(&order_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["estimated_price"], preview["estimated_price"]);
    assert!(body["order_number"].as_str().unwrap().starts_with("LC-"));
}
