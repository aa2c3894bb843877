mod common;

use axum::{http::StatusCode, routing::get, Json, Router};
use chrono::{Duration, Utc};
use serde_json::json;

use car_wash_backend::services::exchange_rate::{
    read_cache, write_cache, CachedRate, ExchangeRateProvider, RateOrigin,
};
use common::{closed_url, rate_settings, serve};

async fn keyed_source(rate: f64) -> String {
    let router = Router::new().route(
        "/latest",
        get(move || async move { Json(json!({ "result": "success", "rates": { "USD": 1, "VES": rate } })) }),
    );
    format!("{}/latest", serve(router).await)
}

async fn averaged_source(rate: f64) -> String {
    let router = Router::new().route(
        "/oficial",
        get(move || async move { Json(json!({ "fuente": "oficial", "promedio": rate })) }),
    );
    format!("{}/oficial", serve(router).await)
}

async fn failing_source() -> String {
    let router = Router::new().route("/latest", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    format!("{}/latest", serve(router).await)
}

#[tokio::test]
async fn primary_source_wins_and_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("rate.json");
    let provider = ExchangeRateProvider::new(rate_settings(
        keyed_source(36.42).await,
        averaged_source(99.0).await,
        cache.clone(),
    ))
    .unwrap();

    let quote = provider.refresh().await;
    assert_eq!(quote.rate, 36.42);
    assert_eq!(quote.origin, RateOrigin::Primary);
    assert!(quote.error.is_none());

    let cached = read_cache(&cache).await.unwrap();
    assert_eq!(cached.rate, 36.42);
}

#[tokio::test]
async fn backup_is_used_when_primary_fails() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ExchangeRateProvider::new(rate_settings(
        failing_source().await,
        averaged_source(37.1).await,
        dir.path().join("rate.json"),
    ))
    .unwrap();

    let quote = provider.refresh().await;
    assert_eq!(quote.rate, 37.1);
    assert_eq!(quote.origin, RateOrigin::Backup);
}

#[tokio::test]
async fn zero_rate_counts_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ExchangeRateProvider::new(rate_settings(
        keyed_source(0.0).await,
        averaged_source(37.1).await,
        dir.path().join("rate.json"),
    ))
    .unwrap();

    assert_eq!(provider.refresh().await.origin, RateOrigin::Backup);
}

#[tokio::test]
async fn fresh_cache_covers_both_sources_down() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("rate.json");
    write_cache(
        &cache,
        &CachedRate {
            rate: 35.9,
            fetched_at: Utc::now() - Duration::hours(3),
        },
    )
    .await
    .unwrap();

    let provider =
        ExchangeRateProvider::new(rate_settings(closed_url().await, closed_url().await, cache)).unwrap();

    let quote = provider.refresh().await;
    assert_eq!(quote.rate, 35.9);
    assert_eq!(quote.origin, RateOrigin::Cache);
    assert!(quote.error.is_some());
}

#[tokio::test]
async fn stale_cache_falls_through_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("rate.json");
    write_cache(
        &cache,
        &CachedRate {
            rate: 35.9,
            fetched_at: Utc::now() - Duration::hours(30),
        },
    )
    .await
    .unwrap();

    let provider =
        ExchangeRateProvider::new(rate_settings(closed_url().await, closed_url().await, cache)).unwrap();

    let quote = provider.refresh().await;
    assert_eq!(quote.rate, 36.5);
    assert_eq!(quote.origin, RateOrigin::Fallback);
    assert!(quote.error.is_some());
}

#[tokio::test]
async fn current_keeps_last_quote_until_refreshed() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ExchangeRateProvider::new(rate_settings(
        closed_url().await,
        closed_url().await,
        dir.path().join("rate.json"),
    ))
    .unwrap();

    let first = provider.current().await;
    let second = provider.current().await;
    assert_eq!(first, second);
    assert_eq!(first.origin, RateOrigin::Fallback);
}
