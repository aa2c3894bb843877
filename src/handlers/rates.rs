use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::{AppError, AppResult, FieldError};
use crate::services::catalog;
use crate::services::exchange_rate::RateQuote;
use crate::services::pricing::{self, PriceBreakdown};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub service_id: Option<i32>,
    #[serde(default)]
    pub extra_service_ids: Vec<i32>,
    pub exchange_rate: Option<f64>,
}

/// Current USD rate, fetched once if none is loaded yet
pub async fn current_rate(State(state): State<AppState>) -> Json<RateQuote> {
    Json(state.rates.current().await)
}

pub async fn refresh_rate(State(state): State<AppState>) -> Json<RateQuote> {
    Json(state.rates.refresh().await)
}

/// Price a selection with current catalog prices
pub async fn quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<Json<PriceBreakdown>> {
    let catalog = catalog::load(&state.db).await?;

    let mut errors = Vec::new();

    let service_price = match payload.service_id {
        Some(id) => {
            let price = catalog.service(id).map(|s| s.price);
            if price.is_none() {
                errors.push(FieldError::new("service_id", "Unknown service"));
            }
            price
        }
        None => None,
    };

    let mut extras = Vec::new();
    for id in &payload.extra_service_ids {
        match catalog.extra(*id) {
            Some(extra) => extras.push(extra.price),
            None => errors.push(FieldError::new(
                "extra_service_ids",
                format!("Unknown extra service {}", id),
            )),
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let rate = match payload.exchange_rate {
        Some(rate) if rate.is_finite() && rate > 0.0 => rate,
        Some(_) => {
            return Err(AppError::Validation(vec![FieldError::new(
                "exchange_rate",
                "Exchange rate must be greater than zero",
            )]))
        }
        None => state.rates.current().await.rate,
    };

    Ok(Json(pricing::quote(service_price, &extras, Some(rate))))
}
