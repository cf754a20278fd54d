//! Book REST API and health endpoints

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::helpers::TestApp;

fn payload(title: &str) -> serde_json::Value {
    json!({ "title": title, "author": null, "genre": [], "about": "Описание" })
}

#[tokio::test]
async fn should_reject_anonymous_writes() {
    let app = TestApp::new();

    let response = app
        .send_json(Method::POST, "/api/v1/books", None, payload("Анонимная"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.book_count().await, 0);
}

#[tokio::test]
async fn should_forbid_writes_outside_staff_group() {
    let app = TestApp::new();
    let token = app.admin_token();

    let response = app
        .send_json(Method::POST, "/api/v1/books", Some(&token), payload("Чужая"))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.book_count().await, 0);
}

#[tokio::test]
async fn should_create_book_for_staff() {
    let app = TestApp::new();
    let genre = app.create_genre("Сказка").await;
    let token = app.staff_token();

    let response = app
        .send_json(
            Method::POST,
            "/api/v1/books",
            Some(&token),
            json!({ "title": "Колобок", "author": null, "genre": [genre], "about": "Сказка" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["title"], "Колобок");
    assert_eq!(response.body["genre"], json!([genre]));

    let list = app.get("/api/v1/books", None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn should_report_unknown_author_in_payload() {
    let app = TestApp::new();
    let token = app.staff_token();

    let response = app
        .send_json(
            Method::POST,
            "/api/v1/books",
            Some(&token),
            json!({ "title": "Сирота", "author": 999, "genre": [], "about": "Текст" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["errors"]["fields"]["author"].is_array());
}

#[tokio::test]
async fn should_patch_only_given_fields() {
    let app = TestApp::new();
    let token = app.staff_token();
    app.send_json(Method::POST, "/api/v1/books", Some(&token), payload("Черновик"))
        .await;
    let id = app.get("/book/chernovik", None).await.body["book"]["id"]
        .as_i64()
        .expect("id");
    let uri = format!("/api/v1/book/{}", id);

    let response = app
        .send_json(Method::PATCH, &uri, Some(&token), json!({ "title": "Чистовик" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Чистовик");
    assert_eq!(response.body["about"], "Описание");
    assert_eq!(app.get("/book/chistovik", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn should_delete_book_for_staff() {
    let app = TestApp::new();
    let token = app.staff_token();
    app.send_json(Method::POST, "/api/v1/books", Some(&token), payload("Временная"))
        .await;
    let id = app.get("/book/vremennaia", None).await.body["book"]["id"]
        .as_i64()
        .expect("id");
    let uri = format!("/api/v1/book/{}", id);

    let anonymous = app.send_json(Method::DELETE, &uri, None, json!(null)).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let response = app.send_json(Method::DELETE, &uri, Some(&token), json!(null)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_report_health_and_readiness() {
    let app = TestApp::new();

    let health = app.get("/api/v1/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    let ready = app.get("/api/v1/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["store"], "memory");
}
