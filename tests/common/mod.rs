#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveTime;
use http_body_util::BodyExt;
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

use car_wash_backend::config::{BusinessHours, Config, RateSettings};
use car_wash_backend::{db, routes, AppState};
use migration::MigratorTrait;

pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// A port nothing listens on.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn rate_settings(primary_url: String, backup_url: String, cache_path: PathBuf) -> RateSettings {
    RateSettings {
        primary_url,
        backup_url,
        currency: "VES".to_string(),
        fallback_rate: 36.5,
        cache_path,
        refresh_interval: Duration::from_secs(1800),
        request_timeout: Duration::from_secs(2),
    }
}

pub fn config(rates: RateSettings) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 24,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        admin_username: ADMIN.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        rates,
        business: BusinessHours {
            utc_offset_hours: -4,
            open_hour: 7,
            close_hour: 19,
        },
        session_purge_at: NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
        plate_lookup_debounce: Duration::from_millis(50),
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub state: AppState,
    _cache_dir: tempfile::TempDir,
}

/// Router over a fresh in-memory database with the default catalog and an
/// admin account. Both rate sources are unreachable.
pub async fn app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db::seed_admin(&db, ADMIN, ADMIN_PASSWORD).await.unwrap();

    let cache_dir = tempfile::tempdir().unwrap();
    let rates = rate_settings(
        closed_url().await,
        closed_url().await,
        cache_dir.path().join("rate.json"),
    );
    let state = AppState::new(db.clone(), config(rates)).unwrap();

    TestApp {
        router: routes::create_router(state.clone()),
        db,
        state,
        _cache_dir: cache_dir,
    }
}

impl TestApp {
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN, ADMIN_PASSWORD).await
    }
}

/// Check-in for a Sedan with the "Sencillo Sedan" service.
pub fn sedan_checkin(plate: &str, extras: Vec<i32>) -> Value {
    serde_json::json!({
        "client_name": "Maria Perez",
        "national_id": "12345678",
        "phone": "04141234567",
        "plate": plate,
        "color": "Rojo",
        "vehicle_type_id": 1,
        "service_id": 1,
        "extra_service_ids": extras,
        "exchange_rate": 36.5,
    })
}
