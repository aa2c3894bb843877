use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult, FieldError};
use crate::services::statistics::{self, Statistics};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Totals for the inclusive local date range, today by default
pub async fn get_stats(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> AppResult<Json<Statistics>> {
    let today = state.config.business.local_date(Utc::now())?;
    let from = range.from.unwrap_or(today);
    let to = range.to.unwrap_or(from.max(today));

    if from > to {
        return Err(AppError::Validation(vec![FieldError::new(
            "from",
            "Start date must not be after end date",
        )]));
    }

    let (start, end) = state.config.business.day_range(from, to)?;
    Ok(Json(statistics::collect(&state.db, from, to, start, end).await?))
}
