mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use car_wash_backend::entities::category;
use common::app;

#[tokio::test]
async fn category_with_services_cannot_be_deleted() {
    let app = app().await;
    let token = app.admin_token().await;
    let before = category::Entity::find().count(&app.db).await.unwrap();

    let (status, body) = app
        .call(Method::DELETE, "/api/admin/categories/1", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Cannot delete category"));
    assert_eq!(category::Entity::find().count(&app.db).await.unwrap(), before);
}

#[tokio::test]
async fn unused_category_can_be_deleted() {
    let app = app().await;
    let token = app.admin_token().await;

    let (status, created) = app
        .call(
            Method::POST,
            "/api/admin/categories",
            Some(&token),
            Some(json!({ "name": "Moto" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/admin/categories/{}", created["id"]);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_names_conflict() {
    let app = app().await;
    let token = app.admin_token().await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/admin/extras",
            Some(&token),
            Some(json!({ "name": "Encerado", "price": 12.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn services_are_filtered_by_vehicle_category() {
    let app = app().await;
    let token = app.admin_token().await;

    // Pickup belongs to the Camioneta category.
    let (status, body) = app
        .call(Method::GET, "/api/services?vehicle_type_id=5", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Sencillo Camioneta", "Full Camioneta"]);

    let (_, all) = app.call(Method::GET, "/api/services", Some(&token), None).await;
    assert_eq!(all.as_array().unwrap().len(), 4);

    let (status, _) = app
        .call(Method::GET, "/api/services?vehicle_type_id=99", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn service_price_must_not_be_negative() {
    let app = app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/admin/services",
            Some(&token),
            Some(json!({ "name": "Express", "price": -1.0, "category_id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "price");
}

#[tokio::test]
async fn payment_method_with_expenses_is_kept() {
    let app = app().await;
    let token = app.admin_token().await;

    // Give the ledger some income so the expense fits.
    let mut checkin = common::sedan_checkin("PAY123", vec![]);
    checkin["payment_status"] = json!("paid");
    let (status, _) = app.call(Method::POST, "/api/vehicles", Some(&token), Some(checkin)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/expenses",
            Some(&token),
            Some(json!({
                "description": "Jabon",
                "amount": 50.0,
                "currency": "local",
                "exchange_rate": 36.5,
                "payment_method_id": 3,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(Method::DELETE, "/api/admin/payment-methods/3", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
