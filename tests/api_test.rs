mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::test_service;
use http_body_util::BodyExt;
use pokerbank::api::{create_router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt; // For `oneshot` method

async fn test_app() -> Result<(Router, TempDir)> {
    let (service, temp) = test_service().await?;
    Ok((create_router(AppState::new(service, 2000)), temp))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_player(app: &Router, name: &str) -> String {
    let (status, body) = send(app, "POST", "/api/players", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn test_player_lifecycle() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let id = create_player(&app, "Alice").await;

    // No amount means the default buy-in
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/players/{id}/withdrawals"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["totalWithdrawn"], "20.00");
    assert_eq!(body["withdrawals"][0]["addedBy"], "admin");

    // Numbers and strings are both accepted
    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/players/{id}/withdrawals"),
        Some(json!({ "amount": 12.5, "addedBy": "Bob" })),
    )
    .await;
    assert_eq!(body["totalWithdrawn"], "32.50");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/players/{id}"),
        Some(json!({ "finalAmount": "40.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["finalAmount"], "40.00");
    assert_eq!(body["pokerNet"], "7.50");

    let (status, body) = send(&app, "GET", "/api/players", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/players/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn test_error_statuses() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let id = create_player(&app, "Alice").await;

    let (status, body) = send(&app, "POST", "/api/players", Some(json!({ "name": "Alice" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "already_exists");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/players/{id}/withdrawals"),
        Some(json!({ "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_amount");

    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(&app, "DELETE", &format!("/api/players/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/api/food-expenses",
        Some(json!({ "amount": 10, "payerId": id, "consumerIds": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_expense");
    Ok(())
}

#[tokio::test]
async fn test_expenses_and_results() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let a = create_player(&app, "A").await;
    let b = create_player(&app, "B").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/food-expenses",
        Some(json!({ "amount": "10.00", "payerId": b, "consumerIds": [a, b], "description": "pizza" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["share"], "5.00");
    assert_eq!(body["consumerNames"], json!(["A", "B"]));
    let expense_id = body["id"].as_str().unwrap().to_string();

    // B is referenced by the expense
    let (status, body) = send(&app, "DELETE", &format!("/api/players/{b}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "player_in_use");

    let (status, body) = send(&app, "GET", "/api/results", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["foodSummary"]["A"], "-5.00");
    assert_eq!(body["settlements"], json!(["A pays B $5.00"]));

    let (status, body) = send(&app, "GET", "/api/food-expenses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/food-expenses/{expense_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn test_results_imbalance_is_unprocessable() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let a = create_player(&app, "A").await;
    send(
        &app,
        "POST",
        &format!("/api/players/{a}/withdrawals"),
        Some(json!({ "amount": 20 })),
    )
    .await;
    send(&app, "PUT", &format!("/api/players/{a}"), Some(json!({ "finalAmount": 15 }))).await;

    let (status, body) = send(&app, "GET", "/api/bank", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isBalanced"], false);
    assert_eq!(body["difference"], "-5.00");

    let (status, body) = send(&app, "GET", "/api/results", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "imbalance");
    assert_eq!(body["ledger"], "poker");
    assert_eq!(body["difference"], "-5.00");
    Ok(())
}
