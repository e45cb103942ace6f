mod common;

use axum::http::{header, StatusCode};
use chrono::Utc;
use serde_json::json;

use common::{api, body_bytes, body_json, get, spawn_app, PASSWORD};
use marketplace::db::services as db_services;

fn today() -> String {
    Utc::now().date_naive().format("%d-%m-%Y").to_string()
}

#[tokio::test]
async fn health_check_answers_ok() {
    let app = spawn_app().await;
    let response = app.send(get("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn empty_catalog_is_not_found() {
    let app = spawn_app().await;
    let response = app.send(get("/api/products")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_lists_every_product() {
    let app = spawn_app().await;
    app.product("Basic", 10.0).await;
    app.product("Pro", 40.0).await;

    let response = app.send(get("/api/products")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let products = body_json(response).await;
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["category"], "Basic");
    assert_eq!(products[1]["price"], 40.0);
}

#[tokio::test]
async fn only_admins_edit_the_catalog() {
    let app = spawn_app().await;
    let (_, client_token) = app.client("client@example.com").await;
    let (_, admin_token) = app.admin("admin@example.com").await;
    let body = json!({"category": "Basic", "price": 12.5, "ram": 2, "cores": 1, "storage": 40, "transfer": 500});

    let response = app
        .send(api("POST", "/api/products", Some(&client_token), Some(body.clone())))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(api("POST", "/api/products", Some(&admin_token), Some(body)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();

    let update = json!({"category": "Basic", "price": 15.0, "ram": 2, "cores": 1, "storage": 40, "transfer": 500});
    let response = app
        .send(api("PUT", &format!("/api/products/{id}"), Some(&admin_token), Some(update)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(get(&format!("/api/products/{id}"))).await;
    assert_eq!(body_json(response).await["price"], 15.0);
}

#[tokio::test]
async fn invalid_product_is_rejected() {
    let app = spawn_app().await;
    let (_, admin_token) = app.admin("admin@example.com").await;
    let body = json!({"category": "Basic", "price": -1.0, "ram": 2, "cores": 1, "storage": 40, "transfer": 500});
    let response = app
        .send(api("POST", "/api/products", Some(&admin_token), Some(body)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = spawn_app().await;
    let response = app.send(get("/api/products/999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn statistics_require_an_admin() {
    let app = spawn_app().await;
    let (_, client_token) = app.client("client@example.com").await;
    let (_, admin_token) = app.admin("admin@example.com").await;

    let response = app.send(api("GET", "/api/statistics", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(api("GET", "/api/statistics", Some(&client_token), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(api("GET", "/api/statistics", Some(&admin_token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["current_week_sales"].as_array().unwrap().len(), 7);
    assert_eq!(stats["accumulated_capital"], 0.0);
    assert!(stats["category_weekly_purchases"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_replaces_current_sale() {
    let app = spawn_app().await;
    let (_, admin_token) = app.admin("admin@example.com").await;
    let basic = app.product("Basic", 100.0).await;
    let pro = app.product("Pro", 200.0).await;

    let first = json!({"product_id": basic.id, "start": today(), "stop": today(), "discount": 10, "enabled": true});
    let response = app
        .send(api("PUT", "/api/sales/otd", Some(&admin_token), Some(first)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let second = json!({"product_id": pro.id, "start": today(), "stop": today(), "discount": 30, "enabled": true});
    app.send(api("PUT", "/api/sales/otd", Some(&admin_token), Some(second)))
        .await;

    let response = app.send(get("/api/sales")).await;
    let sales = body_json(response).await;
    assert_eq!(sales["otd"]["product_id"], pro.id);
    assert_eq!(sales["otd"]["discount"], 30);
    assert!(sales["ad"].is_null());
}

#[tokio::test]
async fn sale_validation() {
    let app = spawn_app().await;
    let (_, admin_token) = app.admin("admin@example.com").await;
    let (_, client_token) = app.client("client@example.com").await;
    let basic = app.product("Basic", 100.0).await;

    let too_much = json!({"product_id": basic.id, "start": today(), "stop": today(), "discount": 150, "enabled": true});
    let response = app
        .send(api("PUT", "/api/sales/ad", Some(&admin_token), Some(too_much)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown = json!({"product_id": 999, "start": today(), "stop": today(), "discount": 5, "enabled": true});
    let response = app
        .send(api("PUT", "/api/sales/ad", Some(&admin_token), Some(unknown)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let fine = json!({"product_id": basic.id, "start": today(), "stop": today(), "discount": 5, "enabled": true});
    let response = app
        .send(api("PUT", "/api/sales/ad", Some(&client_token), Some(fine)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_me() {
    let app = spawn_app().await;
    let body = json!({
        "first_name": "Grace",
        "surname": "Hopper",
        "address": "1 Harbour Way",
        "email": "grace@example.com",
        "password": PASSWORD,
    });
    let response = app.send(api("POST", "/api/auth/register", None, Some(body.clone()))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.send(api("POST", "/api/auth/register", None, Some(body))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let login = json!({"email": "grace@example.com", "password": PASSWORD});
    let response = app.send(api("POST", "/api/auth/login", None, Some(login))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    let token = body_json(response).await["token"].as_str().unwrap().to_string();

    let response = app.send(api("GET", "/api/auth/me", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["email"], "grace@example.com");
    assert_eq!(me["roles"], json!(["ROLE_CLIENT"]));
}

#[tokio::test]
async fn disabled_user_cannot_log_in() {
    let app = spawn_app().await;
    let (_, admin_token) = app.admin("admin@example.com").await;
    let (client_id, client_token) = app.client("client@example.com").await;

    let response = app
        .send(api("POST", &format!("/api/users/{client_id}/disable"), Some(&admin_token), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["enabled"], false);

    let login = json!({"email": "client@example.com", "password": PASSWORD});
    let response = app.send(api("POST", "/api/auth/login", None, Some(login.clone()))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(api("GET", "/api/auth/me", Some(&client_token), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.send(api("POST", &format!("/api/users/{client_id}/enable"), Some(&admin_token), None))
        .await;
    let response = app.send(api("POST", "/api/auth/login", None, Some(login))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn profiles_are_edited_by_owner_or_admin() {
    let app = spawn_app().await;
    let (alice_id, alice_token) = app.client("alice@example.com").await;
    let (bob_id, _) = app.client("bob@example.com").await;

    let update = json!({
        "first_name": "Alice",
        "surname": "Liddell",
        "address": "Wonderland",
        "email": "alice@example.com",
        "password": "   ",
    });
    let response = app
        .send(api("PUT", &format!("/api/users/{bob_id}"), Some(&alice_token), Some(update.clone())))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(api("PUT", &format!("/api/users/{alice_id}"), Some(&alice_token), Some(update)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["surname"], "Liddell");

    // The blank password left the old one in place.
    let login = json!({"email": "alice@example.com", "password": PASSWORD});
    let response = app.send(api("POST", "/api/auth/login", None, Some(login))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let taken = json!({
        "first_name": "Alice",
        "surname": "Liddell",
        "address": "Wonderland",
        "email": "bob@example.com",
    });
    let response = app
        .send(api("PUT", &format!("/api/users/{alice_id}"), Some(&alice_token), Some(taken)))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_lists_and_deletes_users() {
    let app = spawn_app().await;
    let (_, admin_token) = app.admin("admin@example.com").await;
    let (client_id, client_token) = app.client("client@example.com").await;

    let response = app.send(api("GET", "/api/users?page=1&size=10", Some(&client_token), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(api("GET", "/api/users?page=1&size=10", Some(&admin_token), None)).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app
        .send(api("DELETE", &format!("/api/users/{client_id}"), Some(&admin_token), None))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.send(api("GET", "/api/users", Some(&admin_token), None)).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn users_with_orders_cannot_be_deleted() {
    let app = spawn_app().await;
    let (_, admin_token) = app.admin("admin@example.com").await;
    let (client_id, _) = app.client("client@example.com").await;
    let product = app.product("Pro", 200.0).await;
    db_services::place_order(&app.state.db_pool, client_id, product.id, Utc::now())
        .await
        .unwrap()
        .unwrap();

    let response = app
        .send(api("DELETE", &format!("/api/users/{client_id}"), Some(&admin_token), None))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.send(api("GET", "/api/statistics", Some(&admin_token), None)).await;
    assert_eq!(body_json(response).await["accumulated_capital"], 200.0);

    let response = app
        .send(api("POST", &format!("/api/users/{client_id}/disable"), Some(&admin_token), None))
        .await;
    assert!(response.status().is_success());
}

#[tokio::test]
async fn user_listing_caps_page_size() {
    let app = spawn_app().await;
    let (_, admin_token) = app.admin("admin@example.com").await;
    app.client("client@example.com").await;

    let response = app
        .send(api("GET", "/api/users?page=3&size=10000000000000000000", Some(&admin_token), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}
