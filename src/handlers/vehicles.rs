use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::vehicle_record::{CarStatus, PaymentStatus};
use crate::entities::{extra_service, vehicle_record, vehicle_record_extra};
use crate::error::{AppError, AppResult, FieldError};
use crate::services::catalog::{self, Catalog};
use crate::services::plate_lookup::{find_latest_by_plate, PlateLookup};
use crate::services::pricing::{self, PriceBreakdown};
use crate::services::registration::RegistrationDraft;
use crate::utils::jwt::Claims;
use crate::utils::plate::normalize_plate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VehicleRequest {
    #[serde(flatten)]
    pub draft: RegistrationDraft,
    pub car_status: Option<CarStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Rate to price with; the provider's current rate when absent.
    pub exchange_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub car_status: Option<CarStatus>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleFilter {
    pub date: Option<NaiveDate>,
    pub plate: Option<String>,
    pub car_status: Option<CarStatus>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Serialize)]
pub struct ExtraLine {
    pub id: i32,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub client_name: String,
    pub national_id: String,
    pub phone: String,
    pub plate: String,
    pub color: String,
    pub vehicle_type_id: i32,
    pub vehicle_type: String,
    pub category: String,
    pub service_id: i32,
    pub service: String,
    pub extras: Vec<ExtraLine>,
    pub car_status: CarStatus,
    pub payment_status: PaymentStatus,
    pub total_usd: f64,
    pub total_local: Option<f64>,
    pub exchange_rate: Option<f64>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Prices of a validated selection, taken from the current catalog.
struct PricedSelection {
    service_id: i32,
    vehicle_type_id: i32,
    extras: Vec<(i32, f64)>,
    breakdown: PriceBreakdown,
}

fn price_selection(
    catalog: &Catalog,
    draft: &RegistrationDraft,
    rate: f64,
) -> AppResult<PricedSelection> {
    let mut errors = Vec::new();

    let vehicle_type_id = draft.vehicle_type_id.unwrap_or_default();
    if catalog.vehicle_type(vehicle_type_id).is_none() {
        errors.push(FieldError::new("vehicle_type_id", "Unknown vehicle type"));
    }

    let service_id = draft.service_id.unwrap_or_default();
    let service_price = catalog.service(service_id).map(|s| s.price);
    if service_price.is_none() {
        errors.push(FieldError::new("service_id", "Unknown service"));
    } else if errors.is_empty()
        && catalog
            .retain_service(Some(vehicle_type_id), Some(service_id))
            .is_none()
    {
        errors.push(FieldError::new(
            "service_id",
            "Service is not offered for this vehicle type",
        ));
    }

    let mut extras: Vec<(i32, f64)> = Vec::new();
    for id in &draft.extra_service_ids {
        if extras.iter().any(|(e, _)| e == id) {
            continue;
        }
        match catalog.extra(*id) {
            Some(extra) => extras.push((extra.id, extra.price)),
            None => {
                errors.push(FieldError::new(
                    "extra_service_ids",
                    format!("Unknown extra service {}", id),
                ));
            }
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let prices: Vec<f64> = extras.iter().map(|(_, p)| *p).collect();
    Ok(PricedSelection {
        service_id,
        vehicle_type_id,
        breakdown: pricing::quote(service_price, &prices, Some(rate)),
        extras,
    })
}

fn check_rate(rate: f64) -> AppResult<f64> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(AppError::Validation(vec![FieldError::new(
            "exchange_rate",
            "Exchange rate must be greater than zero",
        )]));
    }
    Ok(rate)
}

/// A plate may only have one record that is not yet completed.
async fn ensure_no_open_record(
    db: &DatabaseConnection,
    plate: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut query = vehicle_record::Entity::find()
        .filter(vehicle_record::Column::Plate.eq(plate))
        .filter(vehicle_record::Column::CarStatus.ne(CarStatus::Completed));
    if let Some(id) = except {
        query = query.filter(vehicle_record::Column::Id.ne(id));
    }

    if query.count(db).await? > 0 {
        return Err(AppError::Conflict(format!(
            "Vehicle {} already has an open record",
            plate
        )));
    }
    Ok(())
}

async fn replace_extras<C: ConnectionTrait>(
    conn: &C,
    record_id: Uuid,
    extras: &[(i32, f64)],
) -> AppResult<()> {
    vehicle_record_extra::Entity::delete_many()
        .filter(vehicle_record_extra::Column::RecordId.eq(record_id))
        .exec(conn)
        .await?;

    for (extra_service_id, price) in extras {
        vehicle_record_extra::ActiveModel {
            record_id: Set(record_id),
            extra_service_id: Set(*extra_service_id),
            price: Set(*price),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn to_responses(
    db: &DatabaseConnection,
    records: Vec<vehicle_record::Model>,
) -> AppResult<Vec<VehicleResponse>> {
    let catalog = catalog::load(db).await?;

    let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
    let mut extras_by_record: HashMap<Uuid, Vec<ExtraLine>> = HashMap::new();
    if !ids.is_empty() {
        let names: HashMap<i32, String> = extra_service::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.id, e.name))
            .collect();

        for row in vehicle_record_extra::Entity::find()
            .filter(vehicle_record_extra::Column::RecordId.is_in(ids))
            .all(db)
            .await?
        {
            extras_by_record.entry(row.record_id).or_default().push(ExtraLine {
                id: row.extra_service_id,
                name: names.get(&row.extra_service_id).cloned().unwrap_or_default(),
                price: row.price,
            });
        }
    }

    Ok(records
        .into_iter()
        .map(|r| {
            let vt = catalog.vehicle_type(r.vehicle_type_id);
            VehicleResponse {
                vehicle_type: vt.map(|v| v.name.clone()).unwrap_or_default(),
                category: vt.map(|v| v.category.clone()).unwrap_or_default(),
                service: catalog
                    .service(r.service_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
                extras: extras_by_record.remove(&r.id).unwrap_or_default(),
                id: r.id,
                client_name: r.client_name,
                national_id: r.national_id,
                phone: r.phone,
                plate: r.plate,
                color: r.color,
                vehicle_type_id: r.vehicle_type_id,
                service_id: r.service_id,
                car_status: r.car_status,
                payment_status: r.payment_status,
                total_usd: r.total_usd,
                total_local: r.total_local,
                exchange_rate: r.exchange_rate,
                payment_reference: r.payment_reference,
                notes: r.notes,
                created_by: r.created_by,
                created_at: r.created_at.with_timezone(&Utc),
                updated_at: r.updated_at.with_timezone(&Utc),
            }
        })
        .collect())
}

async fn find_record(db: &DatabaseConnection, id: Uuid) -> AppResult<vehicle_record::Model> {
    vehicle_record::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle record not found".to_string()))
}

async fn single_response(db: &DatabaseConnection, record: vehicle_record::Model) -> AppResult<VehicleResponse> {
    to_responses(db, vec![record])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Vehicle record vanished".to_string()))
}

/// List records, newest first
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(filter): Query<VehicleFilter>,
) -> AppResult<Json<Vec<VehicleResponse>>> {
    let mut query = vehicle_record::Entity::find().order_by_desc(vehicle_record::Column::CreatedAt);

    if let Some(date) = filter.date {
        let (start, end) = state.config.business.day_range(date, date)?;
        query = query
            .filter(vehicle_record::Column::CreatedAt.gte(start))
            .filter(vehicle_record::Column::CreatedAt.lt(end));
    }
    if let Some(plate) = filter.plate.as_deref().map(normalize_plate).filter(|p| !p.is_empty()) {
        query = query.filter(vehicle_record::Column::Plate.contains(&plate));
    }
    if let Some(status) = filter.car_status {
        query = query.filter(vehicle_record::Column::CarStatus.eq(status));
    }
    if let Some(status) = filter.payment_status {
        query = query.filter(vehicle_record::Column::PaymentStatus.eq(status));
    }

    let records = query.all(&state.db).await?;
    Ok(Json(to_responses(&state.db, records).await?))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VehicleResponse>> {
    let record = find_record(&state.db, id).await?;
    Ok(Json(single_response(&state.db, record).await?))
}

/// Previous visit details for a plate
pub async fn lookup_plate(
    State(state): State<AppState>,
    Path(plate): Path<String>,
) -> AppResult<Json<PlateLookup>> {
    Ok(Json(find_latest_by_plate(&state.db, &plate).await?))
}

/// Register a vehicle; record and extras are written together
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<VehicleRequest>,
) -> AppResult<(StatusCode, Json<VehicleResponse>)> {
    let draft = payload.draft;
    draft.validate().map_err(AppError::Validation)?;

    let rate = match payload.exchange_rate {
        Some(rate) => check_rate(rate)?,
        None => state.rates.current().await.rate,
    };
    let catalog = catalog::load(&state.db).await?;
    let priced = price_selection(&catalog, &draft, rate)?;

    let plate = normalize_plate(&draft.plate);
    ensure_no_open_record(&state.db, &plate, None).await?;

    let now = Utc::now();
    let txn = state.db.begin().await?;
    let record = vehicle_record::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_name: Set(draft.client_name.trim().to_string()),
        national_id: Set(draft.national_id.trim().to_string()),
        phone: Set(draft.phone.trim().to_string()),
        plate: Set(plate),
        color: Set(draft.color.trim().to_string()),
        vehicle_type_id: Set(priced.vehicle_type_id),
        service_id: Set(priced.service_id),
        car_status: Set(payload.car_status.unwrap_or(CarStatus::Pending)),
        payment_status: Set(payload.payment_status.unwrap_or(PaymentStatus::Pending)),
        total_usd: Set(priced.breakdown.total_usd),
        total_local: Set(priced.breakdown.total_local),
        exchange_rate: Set(priced.breakdown.exchange_rate),
        payment_reference: Set(optional_text(&draft.payment_reference)),
        notes: Set(optional_text(&draft.notes)),
        created_by: Set(Some(claims.sub)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    replace_extras(&txn, record.id, &priced.extras).await?;
    txn.commit().await?;

    tracing::info!(
        record = %record.id,
        plate = %record.plate,
        total_usd = record.total_usd,
        "vehicle registered"
    );

    Ok((StatusCode::CREATED, Json(single_response(&state.db, record).await?)))
}

/// Edit a record; totals are recomputed from current prices
pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VehicleRequest>,
) -> AppResult<Json<VehicleResponse>> {
    let existing = find_record(&state.db, id).await?;

    let draft = payload.draft;
    draft.validate().map_err(AppError::Validation)?;

    let rate = match (payload.exchange_rate, existing.exchange_rate) {
        (Some(rate), _) => check_rate(rate)?,
        (None, Some(rate)) => rate,
        (None, None) => state.rates.current().await.rate,
    };
    let catalog = catalog::load(&state.db).await?;
    let priced = price_selection(&catalog, &draft, rate)?;

    let plate = normalize_plate(&draft.plate);
    let car_status = payload.car_status.unwrap_or(existing.car_status);
    if car_status != CarStatus::Completed {
        ensure_no_open_record(&state.db, &plate, Some(id)).await?;
    }

    let txn = state.db.begin().await?;
    let mut active: vehicle_record::ActiveModel = existing.into();
    active.client_name = Set(draft.client_name.trim().to_string());
    active.national_id = Set(draft.national_id.trim().to_string());
    active.phone = Set(draft.phone.trim().to_string());
    active.plate = Set(plate);
    active.color = Set(draft.color.trim().to_string());
    active.vehicle_type_id = Set(priced.vehicle_type_id);
    active.service_id = Set(priced.service_id);
    active.car_status = Set(car_status);
    if let Some(status) = payload.payment_status {
        active.payment_status = Set(status);
    }
    active.total_usd = Set(priced.breakdown.total_usd);
    active.total_local = Set(priced.breakdown.total_local);
    active.exchange_rate = Set(priced.breakdown.exchange_rate);
    active.payment_reference = Set(optional_text(&draft.payment_reference));
    active.notes = Set(optional_text(&draft.notes));
    active.updated_at = Set(Utc::now().into());
    let record = active.update(&txn).await?;
    replace_extras(&txn, record.id, &priced.extras).await?;
    txn.commit().await?;

    Ok(Json(single_response(&state.db, record).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<VehicleResponse>> {
    if payload.car_status.is_none() && payload.payment_status.is_none() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }
    let existing = find_record(&state.db, id).await?;
    if let Some(status) = payload.car_status {
        if status != CarStatus::Completed {
            ensure_no_open_record(&state.db, &existing.plate, Some(id)).await?;
        }
    }

    let mut active: vehicle_record::ActiveModel = existing.into();
    if let Some(status) = payload.car_status {
        active.car_status = Set(status);
    }
    if let Some(status) = payload.payment_status {
        active.payment_status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());
    let record = active.update(&state.db).await?;

    tracing::debug!(
        record = %record.id,
        car_status = ?record.car_status,
        payment_status = ?record.payment_status,
        "status updated"
    );
    Ok(Json(single_response(&state.db, record).await?))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    find_record(&state.db, id).await?;

    let txn = state.db.begin().await?;
    replace_extras(&txn, id, &[]).await?;
    vehicle_record::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(Json(serde_json::json!({ "message": "Vehicle record deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::fixtures::catalog as fixture;

    fn draft(vehicle_type_id: i32, service_id: i32, extras: Vec<i32>) -> RegistrationDraft {
        RegistrationDraft {
            client_name: "Maria".into(),
            national_id: "12345678".into(),
            phone: "04141234567".into(),
            plate: "AB123CD".into(),
            color: "Rojo".into(),
            vehicle_type_id: Some(vehicle_type_id),
            service_id: Some(service_id),
            extra_service_ids: extras,
            ..Default::default()
        }
    }

    #[test]
    fn selection_is_priced_from_catalog() {
        let priced = price_selection(&fixture(), &draft(1, 1, vec![1, 1]), 36.5).unwrap();
        assert_eq!(priced.extras, vec![(1, 15.0)]);
        assert_eq!(priced.breakdown.total_usd, 21.0);
        assert_eq!(priced.breakdown.total_local, Some(766.5));
    }

    #[test]
    fn service_from_other_category_is_rejected() {
        match price_selection(&fixture(), &draft(4, 1, vec![]), 36.5) {
            Err(AppError::Validation(fields)) => assert_eq!(fields[0].field, "service_id"),
            _ => panic!("expected a validation error"),
        }
    }

    #[test]
    fn unknown_extra_is_rejected() {
        assert!(matches!(
            price_selection(&fixture(), &draft(1, 1, vec![99]), 36.5),
            Err(AppError::Validation(_))
        ));
    }
}
