//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use shop::auth::token::DEFAULT_TOKEN_TTL;
use shop::{InMemoryUploadSigner, TokenIssuer, UploadService};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            api::routes::metrics::install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with(uploads: UploadService) -> Router {
    let tokens = Arc::new(TokenIssuer::new("api-test-secret", DEFAULT_TOKEN_TTL));
    let state = Arc::new(AppState::new(InMemoryStore::new(), tokens, uploads));
    api::create_app(state, get_metrics_handle())
}

fn setup() -> Router {
    setup_with(UploadService::unconfigured())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, email: &str, is_admin: bool) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "name": "Tester",
            "password": "secret1",
            "isAdmin": is_admin,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["token"].as_str().unwrap().to_string()
}

async fn create_product(app: &Router, admin: &str, name: &str, price: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/shop/products",
        Some(admin),
        Some(json!({ "name": name, "price": price })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_register_and_sign_in() {
    let app = setup();
    register(&app, "ada@example.com", false).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": "ada@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["token"].is_string());
    assert_eq!(json["user"]["email"], "ada@example.com");
    assert!(json["user"].get("passwordHash").is_none());

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "userRegistered": false }));

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = setup();
    register(&app, "ada@example.com", false).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "ada@example.com", "name": "Ada", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Email already registered");
}

#[tokio::test]
async fn test_change_password_requires_token() {
    let app = setup();
    let token = register(&app, "ada@example.com", false).await;
    let body = json!({ "currentPassword": "secret1", "newPassword": "secret2" });

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/change-password",
        None,
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/change-password",
        Some("garbage"),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/change-password",
        Some(&token),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Password updated");
}

#[tokio::test]
async fn test_admin_routes_are_guarded() {
    let app = setup();
    let user = register(&app, "user@example.com", false).await;
    let admin = register(&app, "admin@example.com", true).await;
    let body = json!({ "name": "Tools" });

    let (status, _) = send(&app, "POST", "/api/shop/categories", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(
        &app,
        "POST",
        "/api/shop/categories",
        Some(&user),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "forbidden");

    let (status, json) =
        send(&app, "POST", "/api/shop/categories", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["name"], "Tools");
    assert_eq!(json["visible"], true);

    let (status, _) = send(&app, "GET", "/api/dashboard/stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_checkout_flow() {
    let app = setup();
    let admin = register(&app, "admin@example.com", true).await;
    let buyer = register(&app, "buyer@example.com", false).await;
    let p1 = create_product(&app, &admin, "P1", "5.00").await;
    let p2 = create_product(&app, &admin, "P2", "3.00").await;

    let (status, cart) = send(
        &app,
        "POST",
        "/api/shop/cart",
        None,
        Some(json!({ "items": [
            { "productId": p1, "quantity": 2 },
            { "productId": p2, "quantity": 1 },
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cart["totalAmount"], "13.00");
    let cart_id = cart["id"].as_str().unwrap().to_string();

    let (status, order) = send(
        &app,
        "POST",
        "/api/shop/orders",
        Some(&buyer),
        Some(json!({ "cartId": cart_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["totalAmount"], "13.00");
    assert_eq!(order["items"][0]["unitPrice"], "5.00");
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "GET", &format!("/api/shop/cart/{cart_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/shop/products/{p1}"),
        Some(&admin),
        Some(json!({ "price": "20.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let status_uri = format!("/api/shop/orders/{order_id}/status");
    let (status, json) = send(
        &app,
        "PATCH",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "shipped" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["fields"][0]["field"], "status");

    for _ in 0..2 {
        let (status, json) = send(
            &app,
            "PATCH",
            &status_uri,
            Some(&admin),
            Some(json!({ "status": "completed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "completed");
    }

    let (status, mine) = send(&app, "GET", "/api/shop/orders/me", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["pages"], 1);
    assert_eq!(mine["data"][0]["items"][0]["unitPrice"], "5.00");
    assert_eq!(mine["data"][0]["totalAmount"], "13.00");

    let (status, stats) = send(&app, "GET", "/api/dashboard/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalProducts"], 2);
    assert_eq!(stats["ordersCount"], 1);
    assert_eq!(stats["last10Orders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_replace_items_on_missing_cart() {
    let app = setup();
    let admin = register(&app, "admin@example.com", true).await;
    let p1 = create_product(&app, &admin, "P1", "5.00").await;

    let (status, json) = send(
        &app,
        "PUT",
        "/api/shop/cart/5f0c6b2e-8d1a-4c1e-9a57-3f1f2f0b9d11",
        None,
        Some(json!({ "items": [{ "productId": p1, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Cart not found");
}

#[tokio::test]
async fn test_bad_input_is_a_validation_error() {
    let app = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/api/shop/cart")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let empty = json!({ "items": [] });
    let (status, json) = send(&app, "POST", "/api/shop/cart", None, Some(empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["fields"][0]["field"], "items");

    let (status, json) = send(&app, "GET", "/api/shop/products/42", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["fields"][0]["field"], "id");
}

#[tokio::test]
async fn test_amount_limits_are_validation_errors() {
    let app = setup();
    let admin = register(&app, "admin@example.com", true).await;

    for price in [json!("0.001"), json!("10000000000000000000000")] {
        let body = json!({ "name": "Odd", "price": price });
        let (status, json) =
            send(&app, "POST", "/api/shop/products", Some(&admin), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["fields"][0]["field"], "price");
    }

    let dear = create_product(&app, &admin, "Dear", "9999999999.99").await;
    let body = json!({ "items": [{ "productId": dear, "quantity": 100_000_000 }] });
    let (status, json) = send(&app, "POST", "/api/shop/cart", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["fields"][0]["field"], "items");
}

#[tokio::test]
async fn test_lenient_pagination_and_search() {
    let app = setup();
    let admin = register(&app, "admin@example.com", true).await;
    for i in 0..12 {
        create_product(&app, &admin, &format!("Lamp {i}"), "1.00").await;
    }
    create_product(&app, &admin, "Chair", "9.00").await;

    let uri = "/api/shop/products?page=abc&limit=0";
    let (status, page) = send(&app, "GET", uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 10);
    assert_eq!(page["total"], 13);
    assert_eq!(page["pages"], 2);

    let (status, found) = send(
        &app,
        "GET",
        "/api/shop/products/search?q=LAMP&limit=500",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["limit"], 100);
    assert_eq!(found["total"], 12);
}

#[tokio::test]
async fn test_category_listing_modes() {
    let app = setup();
    let admin = register(&app, "admin@example.com", true).await;
    for (name, sort) in [("B", 2), ("A", 1)] {
        send(
            &app,
            "POST",
            "/api/shop/categories",
            Some(&admin),
            Some(json!({ "name": name, "sortID": sort })),
        )
        .await;
    }

    let (_, all) = send(&app, "GET", "/api/shop/categories?all", None, None).await;
    let names: Vec<_> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["A", "B"]);

    let (_, page) = send(&app, "GET", "/api/shop/categories?limit=1", None, None).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["pages"], 2);
    assert_eq!(page["data"][0]["name"], "A");
}

#[tokio::test]
async fn test_upload_signing() {
    let app = setup();
    let admin = register(&app, "admin@example.com", true).await;
    let (status, json) = send(&app, "POST", "/api/uploads/sign", Some(&admin), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal_error");

    let app = setup_with(UploadService::new(Arc::new(InMemoryUploadSigner::new())));
    let admin = register(&app, "admin@example.com", true).await;
    let (status, json) = send(
        &app,
        "POST",
        "/api/uploads/sign",
        Some(&admin),
        Some(json!({ "fileName": "my photo.png", "contentType": "image/png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["objectPath"].as_str().unwrap().ends_with("-my_photo.png"));
    assert_eq!(json["contentType"], "image/png");
    assert!(json["signedUrl"].is_string());
    assert!(json["publicUrl"].is_string());
}
