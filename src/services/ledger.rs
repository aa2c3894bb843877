use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::entities::payment_method::Currency;
use crate::entities::vehicle_record::PaymentStatus;
use crate::entities::{expense, vehicle_record};
use crate::error::{AppError, AppResult, FieldError};
use crate::utils::money::{round_cents, round_rate};

/// Both sides of an expense, derived once at entry time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conversion {
    pub amount_usd: f64,
    pub amount_local: f64,
    pub exchange_rate: f64,
}

/// Available money for one accounting scope. Never stored; always re-summed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Balance {
    pub income_local: f64,
    pub spent_local: f64,
    pub available_local: f64,
}

pub fn convert(amount: f64, currency: Currency, rate: f64) -> AppResult<Conversion> {
    let mut errors = Vec::new();
    if !amount.is_finite() || amount <= 0.0 {
        errors.push(FieldError::new("amount", "Amount must be greater than zero"));
    }
    if !rate.is_finite() || rate <= 0.0 {
        errors.push(FieldError::new("exchange_rate", "Exchange rate must be greater than zero"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let rate = round_rate(rate);
    let (amount_usd, amount_local) = match currency {
        Currency::Usd => (round_cents(amount), round_cents(amount * rate)),
        Currency::Local => (round_cents(amount / rate), round_cents(amount)),
    };

    Ok(Conversion {
        amount_usd,
        amount_local,
        exchange_rate: rate,
    })
}

pub fn balance<I, E>(income: I, spent: E) -> Balance
where
    I: IntoIterator<Item = f64>,
    E: IntoIterator<Item = f64>,
{
    let income_local = round_cents(income.into_iter().sum());
    let spent_local = round_cents(spent.into_iter().sum());
    Balance {
        income_local,
        spent_local,
        available_local: round_cents(income_local - spent_local),
    }
}

/// A new expense may not take more than what is available.
pub fn ensure_affordable(amount_local: f64, available: f64) -> AppResult<()> {
    if round_cents(amount_local) > round_cents(available) {
        return Err(AppError::BadRequest(format!(
            "Expense of {:.2} exceeds the available balance of {:.2}",
            amount_local, available
        )));
    }
    Ok(())
}

/// An edit only needs room for the growth over the original amount.
pub fn ensure_edit_affordable(original_local: f64, new_local: f64, available: f64) -> AppResult<()> {
    let delta = round_cents(new_local - original_local);
    if delta > round_cents(available) {
        return Err(AppError::BadRequest(format!(
            "Increase of {:.2} exceeds the available balance of {:.2}",
            delta, available
        )));
    }
    Ok(())
}

/// Paid record income minus expenses, both within `[start, end)`.
pub async fn balance_between(
    db: &DatabaseConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<Balance> {
    let income = vehicle_record::Entity::find()
        .filter(vehicle_record::Column::PaymentStatus.eq(PaymentStatus::Paid))
        .filter(vehicle_record::Column::CreatedAt.gte(start))
        .filter(vehicle_record::Column::CreatedAt.lt(end))
        .all(db)
        .await?;

    let spent = expense::Entity::find()
        .filter(expense::Column::CreatedAt.gte(start))
        .filter(expense::Column::CreatedAt.lt(end))
        .all(db)
        .await?;

    Ok(balance(
        income.iter().filter_map(|r| r.total_local),
        spent.iter().map(|e| e.amount_local),
    ))
}
