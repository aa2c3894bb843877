mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{app, sedan_checkin};

#[tokio::test]
async fn registration_prices_service_and_extras() {
    let app = app().await;
    let token = app.admin_token().await;

    let (status, record) = app
        .call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("ab 123cd", vec![1])))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", record);
    assert_eq!(record["plate"], "AB123CD");
    assert_eq!(record["total_usd"], 21.0);
    assert_eq!(record["total_local"], 766.5);
    assert_eq!(record["exchange_rate"], 36.5);
    assert_eq!(record["car_status"], "pending");
    assert_eq!(record["payment_status"], "pending");
    assert_eq!(record["service"], "Sencillo Sedan");
    assert_eq!(record["extras"][0]["name"], "Encerado");
    assert_eq!(record["extras"][0]["price"], 15.0);
}

#[tokio::test]
async fn base_service_alone_converts_at_rate() {
    let app = app().await;
    let token = app.admin_token().await;

    let (_, record) = app
        .call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("XYZ987", vec![])))
        .await;
    assert_eq!(record["total_usd"], 6.0);
    assert_eq!(record["total_local"], 219.0);
}

#[tokio::test]
async fn missing_rate_falls_back_to_configured_default() {
    let app = app().await;
    let token = app.admin_token().await;

    let mut checkin = sedan_checkin("DEF456", vec![]);
    checkin.as_object_mut().unwrap().remove("exchange_rate");
    let (status, record) = app.call(Method::POST, "/api/vehicles", Some(&token), Some(checkin)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["exchange_rate"], 36.5);
    assert_eq!(record["total_local"], 219.0);
}

#[tokio::test]
async fn invalid_fields_are_reported_together() {
    let app = app().await;
    let token = app.admin_token().await;

    let mut checkin = sedan_checkin("AB1", vec![]);
    checkin["national_id"] = json!("123");
    checkin["phone"] = json!("0414");
    checkin["color"] = json!(" ");
    checkin["service_id"] = json!(null);

    let (status, body) = app.call(Method::POST, "/api/vehicles", Some(&token), Some(checkin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["national_id", "phone", "plate", "color", "service_id"]);
}

#[tokio::test]
async fn service_must_match_vehicle_category() {
    let app = app().await;
    let token = app.admin_token().await;

    let mut checkin = sedan_checkin("CAM001", vec![]);
    checkin["vehicle_type_id"] = json!(4);

    let (status, body) = app.call(Method::POST, "/api/vehicles", Some(&token), Some(checkin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "service_id");
}

#[tokio::test]
async fn plate_with_open_record_conflicts() {
    let app = app().await;
    let token = app.admin_token().await;

    let (_, first) = app
        .call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("DUP123", vec![])))
        .await;
    let (status, _) = app
        .call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("DUP123", vec![])))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/vehicles/{}/status", first["id"].as_str().unwrap());
    let (status, done) = app
        .call(Method::PATCH, &uri, Some(&token), Some(json!({ "car_status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["car_status"], "completed");

    let (status, _) = app
        .call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("DUP123", vec![])))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn completed_record_cannot_reopen_beside_a_newer_one() {
    let app = app().await;
    let token = app.admin_token().await;

    let (_, first) = app
        .call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("DUP123", vec![])))
        .await;
    let uri = format!("/api/vehicles/{}/status", first["id"].as_str().unwrap());
    app.call(Method::PATCH, &uri, Some(&token), Some(json!({ "car_status": "completed" })))
        .await;
    let (status, _) = app
        .call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("DUP123", vec![])))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(Method::PATCH, &uri, Some(&token), Some(json!({ "car_status": "pending" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Payment-only changes on the completed record are still allowed.
    let (status, paid) = app
        .call(Method::PATCH, &uri, Some(&token), Some(json!({ "payment_status": "paid" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["car_status"], "completed");

    let (_, open) = app
        .call(Method::GET, "/api/vehicles?plate=DUP123&car_status=pending", Some(&token), None)
        .await;
    assert_eq!(open.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn lookup_returns_latest_visit() {
    let app = app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .call(Method::GET, "/api/vehicles/lookup/NEW999", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], false);

    app.call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("LKP123", vec![])))
        .await;

    let (status, body) = app
        .call(Method::GET, "/api/vehicles/lookup/lkp123", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], true);
    assert_eq!(body["client_info"]["client_name"], "Maria Perez");
    assert_eq!(body["client_info"]["color"], "Rojo");
    assert_eq!(body["vehicle_type_id"], 1);

    let (status, _) = app
        .call(Method::GET, "/api/vehicles/lookup/AB12", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn edit_recomputes_totals_and_replaces_extras() {
    let app = app().await;
    let token = app.admin_token().await;

    let (_, created) = app
        .call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("EDT123", vec![1])))
        .await;
    let uri = format!("/api/vehicles/{}", created["id"].as_str().unwrap());

    let mut edit = sedan_checkin("EDT123", vec![2]);
    edit["service_id"] = json!(2);
    edit["exchange_rate"] = json!(40.0);
    let (status, updated) = app.call(Method::PUT, &uri, Some(&token), Some(edit)).await;

    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["total_usd"], 15.0);
    assert_eq!(updated["total_local"], 600.0);
    assert_eq!(updated["extras"].as_array().unwrap().len(), 1);
    assert_eq!(updated["extras"][0]["name"], "Lavado de motor");

    let (status, _) = app.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quote_uses_catalog_prices() {
    let app = app().await;
    let token = app.admin_token().await;

    let (status, quote) = app
        .call(
            Method::POST,
            "/api/pricing/quote",
            Some(&token),
            Some(json!({ "service_id": 1, "extra_service_ids": [1, 3], "exchange_rate": 36.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["total_usd"], 41.0);
    assert_eq!(quote["total_local"], 1496.5);
}

#[tokio::test]
async fn quote_reports_unknown_items_as_fields() {
    let app = app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/pricing/quote",
            Some(&token),
            Some(json!({ "service_id": 999, "extra_service_ids": [998], "exchange_rate": 36.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "service_id");
    assert_eq!(body["fields"][1]["field"], "extra_service_ids");
}

#[tokio::test]
async fn debounced_lookup_prefills_registration_form() {
    use car_wash_backend::services::catalog;
    use car_wash_backend::services::registration::{FormField, FormStage, PlateAction, RegistrationForm};

    let app = app().await;
    let token = app.admin_token().await;
    app.call(Method::POST, "/api/vehicles", Some(&token), Some(sedan_checkin("FRM123", vec![])))
        .await;

    let catalog = catalog::load(&app.db).await.unwrap();
    let (debouncer, mut outcomes) = app.state.plate_debouncer();
    let mut form = RegistrationForm::new();

    for typed in ["f", "fr", "frm1", "frm12", "frm123"] {
        if let PlateAction::Lookup(plate) = form.set_plate(typed) {
            debouncer.push(&plate);
        }
    }

    let outcome = outcomes.recv().await.unwrap();
    assert_eq!(outcome.plate, "FRM123");
    assert!(form.apply_lookup(&outcome.plate, &outcome.result.unwrap(), &catalog));
    assert_eq!(form.stage(), FormStage::Prefilled);
    assert!(form.is_locked(FormField::Phone));
    assert_eq!(form.draft().client_name, "Maria Perez");
}
