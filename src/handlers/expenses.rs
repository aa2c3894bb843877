use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::payment_method::Currency;
use crate::entities::{expense, payment_method};
use crate::error::{AppError, AppResult, FieldError};
use crate::services::ledger::{self, Balance};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub description: String,
    pub amount: f64,
    pub currency: Currency,
    /// Rate to convert with; the provider's current rate when absent.
    pub exchange_rate: Option<f64>,
    pub payment_method_id: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub balance: Balance,
}

#[derive(Debug, Serialize)]
pub struct ExpenseList {
    pub date: NaiveDate,
    pub expenses: Vec<expense::Model>,
    pub balance: Balance,
}

/// Requested business day, today when absent, with its UTC bounds.
fn business_day(state: &AppState, date: Option<NaiveDate>) -> AppResult<(NaiveDate, DateTime<Utc>, DateTime<Utc>)> {
    let day = match date {
        Some(day) => day,
        None => state.config.business.local_date(Utc::now())?,
    };
    let (start, end) = state.config.business.day_range(day, day)?;
    Ok((day, start, end))
}

async fn validated(state: &AppState, payload: &ExpenseRequest) -> AppResult<ledger::Conversion> {
    if payload.description.trim().is_empty() {
        return Err(AppError::Validation(vec![FieldError::new(
            "description",
            "Description is required",
        )]));
    }

    if let Some(id) = payload.payment_method_id {
        payment_method::Entity::find_by_id(id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid payment method".to_string()))?;
    }

    let rate = match payload.exchange_rate {
        Some(rate) => rate,
        None => state.rates.current().await.rate,
    };
    ledger::convert(payload.amount, payload.currency, rate)
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<ExpenseList>> {
    let (date, start, end) = business_day(&state, query.date)?;

    let expenses = expense::Entity::find()
        .filter(expense::Column::CreatedAt.gte(start))
        .filter(expense::Column::CreatedAt.lt(end))
        .order_by_desc(expense::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let balance = ledger::balance_between(&state.db, start, end).await?;

    Ok(Json(ExpenseList {
        date,
        expenses,
        balance,
    }))
}

pub async fn get_balance(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<BalanceResponse>> {
    let (date, start, end) = business_day(&state, query.date)?;
    let balance = ledger::balance_between(&state.db, start, end).await?;
    Ok(Json(BalanceResponse { date, balance }))
}

/// Record an expense against today's balance
pub async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<ExpenseRequest>,
) -> AppResult<(StatusCode, Json<expense::Model>)> {
    let conversion = validated(&state, &payload).await?;

    let (_, start, end) = business_day(&state, None)?;
    let balance = ledger::balance_between(&state.db, start, end).await?;
    ledger::ensure_affordable(conversion.amount_local, balance.available_local)?;

    let now = Utc::now();
    let created = expense::ActiveModel {
        id: Set(Uuid::new_v4()),
        description: Set(payload.description.trim().to_string()),
        amount: Set(payload.amount),
        currency: Set(payload.currency),
        exchange_rate: Set(conversion.exchange_rate),
        amount_usd: Set(conversion.amount_usd),
        amount_local: Set(conversion.amount_local),
        payment_method_id: Set(payload.payment_method_id),
        notes: Set(optional_text(&payload.notes)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        expense = %created.id,
        amount_local = created.amount_local,
        available_local = balance.available_local - created.amount_local,
        "expense recorded"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edit an expense; only the growth has to fit in its day's balance
pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseRequest>,
) -> AppResult<Json<expense::Model>> {
    let existing = expense::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))?;

    let conversion = validated(&state, &payload).await?;

    let created_at = existing.created_at.with_timezone(&Utc);
    let day = state.config.business.local_date(created_at)?;
    let (_, start, end) = business_day(&state, Some(day))?;
    let balance = ledger::balance_between(&state.db, start, end).await?;
    ledger::ensure_edit_affordable(
        existing.amount_local,
        conversion.amount_local,
        balance.available_local,
    )?;

    let mut active: expense::ActiveModel = existing.into();
    active.description = Set(payload.description.trim().to_string());
    active.amount = Set(payload.amount);
    active.currency = Set(payload.currency);
    active.exchange_rate = Set(conversion.exchange_rate);
    active.amount_usd = Set(conversion.amount_usd);
    active.amount_local = Set(conversion.amount_local);
    active.payment_method_id = Set(payload.payment_method_id);
    active.notes = Set(optional_text(&payload.notes));
    active.updated_at = Set(Utc::now().into());

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = expense::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Expense not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Expense deleted" })))
}
