mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{app, sedan_checkin, TestApp};

async fn paid_checkin(app: &TestApp, token: &str, plate: &str) {
    let mut checkin = sedan_checkin(plate, vec![]);
    checkin["payment_status"] = json!("paid");
    let (status, _) = app.call(Method::POST, "/api/vehicles", Some(token), Some(checkin)).await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn available(app: &TestApp, token: &str) -> f64 {
    let (status, body) = app
        .call(Method::GET, "/api/expenses/balance", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    body["available_local"].as_f64().unwrap()
}

fn expense(amount: f64, currency: &str) -> serde_json::Value {
    json!({
        "description": "Jabon y cera",
        "amount": amount,
        "currency": currency,
        "exchange_rate": 36.5,
    })
}

#[tokio::test]
async fn expense_without_income_is_rejected() {
    let app = app().await;
    let token = app.admin_token().await;

    let (status, _) = app
        .call(Method::POST, "/api/expenses", Some(&token), Some(expense(10.0, "local")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_paid_records_count_as_income() {
    let app = app().await;
    let token = app.admin_token().await;

    app.call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("PEN123", vec![])))
        .await;
    assert_eq!(available(&app, &token).await, 0.0);

    paid_checkin(&app, &token, "PAI123").await;
    assert_eq!(available(&app, &token).await, 219.0);
}

#[tokio::test]
async fn ledger_tracks_create_edit_and_delete() {
    let app = app().await;
    let token = app.admin_token().await;
    paid_checkin(&app, &token, "LED123").await;

    let (status, created) = app
        .call(Method::POST, "/api/expenses", Some(&token), Some(expense(100.0, "local")))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["amount_local"], 100.0);
    assert_eq!(created["amount_usd"], 2.74);
    assert_eq!(available(&app, &token).await, 119.0);

    let (status, _) = app
        .call(Method::POST, "/api/expenses", Some(&token), Some(expense(120.0, "local")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(available(&app, &token).await, 119.0);

    // Growing 100 -> 219 needs exactly the 119 left.
    let uri = format!("/api/expenses/{}", created["id"].as_str().unwrap());
    let (status, _) = app
        .call(Method::PUT, &uri, Some(&token), Some(expense(219.0, "local")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available(&app, &token).await, 0.0);

    // Shrinking always fits.
    let (status, _) = app
        .call(Method::PUT, &uri, Some(&token), Some(expense(1.0, "usd")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available(&app, &token).await, 182.5);

    let (status, _) = app.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available(&app, &token).await, 219.0);

    let (_, listing) = app.call(Method::GET, "/api/expenses", Some(&token), None).await;
    assert!(listing["expenses"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn non_positive_amount_is_a_field_error() {
    let app = app().await;
    let token = app.admin_token().await;
    paid_checkin(&app, &token, "NEG123").await;

    let (status, body) = app
        .call(Method::POST, "/api/expenses", Some(&token), Some(expense(0.0, "usd")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "amount");
}

#[tokio::test]
async fn statistics_cover_the_day() {
    let app = app().await;
    let token = app.admin_token().await;
    paid_checkin(&app, &token, "STA123").await;
    app.call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("STA456", vec![1])))
        .await;
    app.call(Method::POST, "/api/expenses", Some(&token), Some(expense(1.0, "usd")))
        .await;

    let (status, stats) = app.call(Method::GET, "/api/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", stats);
    assert_eq!(stats["vehicle_count"], 2);
    assert_eq!(stats["total_usd"], 27.0);
    assert_eq!(stats["extras_usd"], 15.0);
    assert_eq!(stats["by_payment_status"]["paid"], 1);
    assert_eq!(stats["expenses_local"], 36.5);
    assert_eq!(stats["days"], 1);

    let (status, _) = app
        .call(Method::GET, "/api/stats?from=2024-05-10&to=2024-05-01", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
