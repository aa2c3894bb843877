use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::entities::payment_method::Currency;
use crate::entities::{
    category, expense, extra_service, payment_method, service, vehicle_record,
    vehicle_record_extra, vehicle_type,
};
use crate::error::{AppError, AppResult, FieldError};
use crate::services::catalog::{self, filter_by_category, Catalog, CatalogService};
use crate::AppState;

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(vec![FieldError::new("name", "Name is required")]));
    }
    Ok(name.to_string())
}

fn check_price(price: f64) -> AppResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(vec![FieldError::new(
            "price",
            "Price must be zero or greater",
        )]));
    }
    Ok(())
}

fn in_use(what: &str, count: u64, by: &str) -> AppResult<()> {
    if count > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete {}: it is used by {} {}",
            what, count, by
        )));
    }
    Ok(())
}

async fn ensure_category(db: &DatabaseConnection, id: i32) -> AppResult<()> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("Invalid category".to_string()))
}

fn deleted(what: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": format!("{} deleted", what) }))
}

/// Everything a registration form needs in one call
pub async fn get_catalog(State(state): State<AppState>) -> AppResult<Json<Catalog>> {
    Ok(Json(catalog::load(&state.db).await?))
}

// ============ Categories ============

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<category::Model>>> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(categories))
}

async fn category_name_taken(db: &DatabaseConnection, name: &str, except: Option<i32>) -> AppResult<bool> {
    let mut query = category::Entity::find().filter(category::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(category::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<category::Model>)> {
    let name = required_name(&payload.name)?;
    if category_name_taken(&state.db, &name, None).await? {
        return Err(AppError::Conflict("Category already exists".to_string()));
    }

    let created = category::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<Json<category::Model>> {
    let existing = category::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let name = required_name(&payload.name)?;
    if category_name_taken(&state.db, &name, Some(id)).await? {
        return Err(AppError::Conflict("Category already exists".to_string()));
    }

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(name);
    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    category::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let vehicle_types = vehicle_type::Entity::find()
        .filter(vehicle_type::Column::CategoryId.eq(id))
        .count(&state.db)
        .await?;
    in_use("category", vehicle_types, "vehicle types")?;

    let services = service::Entity::find()
        .filter(service::Column::CategoryId.eq(id))
        .count(&state.db)
        .await?;
    in_use("category", services, "services")?;

    category::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(deleted("Category"))
}

// ============ Vehicle types ============

#[derive(Debug, Deserialize)]
pub struct VehicleTypeRequest {
    pub name: String,
    pub category_id: i32,
}

pub async fn list_vehicle_types(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<catalog::CatalogVehicleType>>> {
    Ok(Json(catalog::load(&state.db).await?.vehicle_types))
}

async fn vehicle_type_name_taken(db: &DatabaseConnection, name: &str, except: Option<i32>) -> AppResult<bool> {
    let mut query = vehicle_type::Entity::find().filter(vehicle_type::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(vehicle_type::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn create_vehicle_type(
    State(state): State<AppState>,
    Json(payload): Json<VehicleTypeRequest>,
) -> AppResult<(StatusCode, Json<vehicle_type::Model>)> {
    let name = required_name(&payload.name)?;
    ensure_category(&state.db, payload.category_id).await?;
    if vehicle_type_name_taken(&state.db, &name, None).await? {
        return Err(AppError::Conflict("Vehicle type already exists".to_string()));
    }

    let created = vehicle_type::ActiveModel {
        name: Set(name),
        category_id: Set(payload.category_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_vehicle_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<VehicleTypeRequest>,
) -> AppResult<Json<vehicle_type::Model>> {
    let existing = vehicle_type::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle type not found".to_string()))?;

    let name = required_name(&payload.name)?;
    ensure_category(&state.db, payload.category_id).await?;
    if vehicle_type_name_taken(&state.db, &name, Some(id)).await? {
        return Err(AppError::Conflict("Vehicle type already exists".to_string()));
    }

    let mut active: vehicle_type::ActiveModel = existing.into();
    active.name = Set(name);
    active.category_id = Set(payload.category_id);
    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_vehicle_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    vehicle_type::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle type not found".to_string()))?;

    let records = vehicle_record::Entity::find()
        .filter(vehicle_record::Column::VehicleTypeId.eq(id))
        .count(&state.db)
        .await?;
    in_use("vehicle type", records, "vehicle records")?;

    vehicle_type::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(deleted("Vehicle type"))
}

// ============ Services ============

#[derive(Debug, Deserialize)]
pub struct ServiceFilter {
    pub vehicle_type_id: Option<i32>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub price: f64,
    pub category_id: i32,
    pub description: Option<String>,
}

/// All services, or only those offered for a vehicle type / category
pub async fn list_services(
    State(state): State<AppState>,
    Query(filter): Query<ServiceFilter>,
) -> AppResult<Json<Vec<CatalogService>>> {
    let catalog = catalog::load(&state.db).await?;

    let services = match (filter.vehicle_type_id, filter.category) {
        (Some(vt), _) => {
            if catalog.vehicle_type(vt).is_none() {
                return Err(AppError::NotFound("Vehicle type not found".to_string()));
            }
            catalog.services_for(vt)
        }
        (None, Some(category)) => filter_by_category(&catalog.services, &category),
        (None, None) => catalog.services,
    };

    Ok(Json(services))
}

async fn service_name_taken(db: &DatabaseConnection, name: &str, except: Option<i32>) -> AppResult<bool> {
    let mut query = service::Entity::find().filter(service::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(service::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<ServiceRequest>,
) -> AppResult<(StatusCode, Json<service::Model>)> {
    let name = required_name(&payload.name)?;
    check_price(payload.price)?;
    ensure_category(&state.db, payload.category_id).await?;
    if service_name_taken(&state.db, &name, None).await? {
        return Err(AppError::Conflict("Service already exists".to_string()));
    }

    let created = service::ActiveModel {
        name: Set(name),
        price: Set(payload.price),
        category_id: Set(payload.category_id),
        description: Set(payload.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ServiceRequest>,
) -> AppResult<Json<service::Model>> {
    let existing = service::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    let name = required_name(&payload.name)?;
    check_price(payload.price)?;
    ensure_category(&state.db, payload.category_id).await?;
    if service_name_taken(&state.db, &name, Some(id)).await? {
        return Err(AppError::Conflict("Service already exists".to_string()));
    }

    let mut active: service::ActiveModel = existing.into();
    active.name = Set(name);
    active.price = Set(payload.price);
    active.category_id = Set(payload.category_id);
    active.description = Set(payload.description);
    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    service::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    let records = vehicle_record::Entity::find()
        .filter(vehicle_record::Column::ServiceId.eq(id))
        .count(&state.db)
        .await?;
    in_use("service", records, "vehicle records")?;

    service::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(deleted("Service"))
}

// ============ Extra services ============

#[derive(Debug, Deserialize)]
pub struct ExtraRequest {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

pub async fn list_extras(State(state): State<AppState>) -> AppResult<Json<Vec<extra_service::Model>>> {
    let extras = extra_service::Entity::find()
        .order_by_asc(extra_service::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(extras))
}

async fn extra_name_taken(db: &DatabaseConnection, name: &str, except: Option<i32>) -> AppResult<bool> {
    let mut query = extra_service::Entity::find().filter(extra_service::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(extra_service::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn create_extra(
    State(state): State<AppState>,
    Json(payload): Json<ExtraRequest>,
) -> AppResult<(StatusCode, Json<extra_service::Model>)> {
    let name = required_name(&payload.name)?;
    check_price(payload.price)?;
    if extra_name_taken(&state.db, &name, None).await? {
        return Err(AppError::Conflict("Extra service already exists".to_string()));
    }

    let created = extra_service::ActiveModel {
        name: Set(name),
        price: Set(payload.price),
        description: Set(payload.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_extra(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ExtraRequest>,
) -> AppResult<Json<extra_service::Model>> {
    let existing = extra_service::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Extra service not found".to_string()))?;

    let name = required_name(&payload.name)?;
    check_price(payload.price)?;
    if extra_name_taken(&state.db, &name, Some(id)).await? {
        return Err(AppError::Conflict("Extra service already exists".to_string()));
    }

    let mut active: extra_service::ActiveModel = existing.into();
    active.name = Set(name);
    active.price = Set(payload.price);
    active.description = Set(payload.description);
    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_extra(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    extra_service::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Extra service not found".to_string()))?;

    let rows = vehicle_record_extra::Entity::find()
        .filter(vehicle_record_extra::Column::ExtraServiceId.eq(id))
        .count(&state.db)
        .await?;
    in_use("extra service", rows, "vehicle records")?;

    extra_service::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(deleted("Extra service"))
}

// ============ Payment methods ============

#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    pub name: String,
    pub currency: Currency,
}

pub async fn list_payment_methods(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<payment_method::Model>>> {
    let methods = payment_method::Entity::find()
        .order_by_asc(payment_method::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(methods))
}

async fn payment_method_name_taken(db: &DatabaseConnection, name: &str, except: Option<i32>) -> AppResult<bool> {
    let mut query = payment_method::Entity::find().filter(payment_method::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(payment_method::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn create_payment_method(
    State(state): State<AppState>,
    Json(payload): Json<PaymentMethodRequest>,
) -> AppResult<(StatusCode, Json<payment_method::Model>)> {
    let name = required_name(&payload.name)?;
    if payment_method_name_taken(&state.db, &name, None).await? {
        return Err(AppError::Conflict("Payment method already exists".to_string()));
    }

    let created = payment_method::ActiveModel {
        name: Set(name),
        currency: Set(payload.currency),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_payment_method(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<PaymentMethodRequest>,
) -> AppResult<Json<payment_method::Model>> {
    let existing = payment_method::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;

    let name = required_name(&payload.name)?;
    if payment_method_name_taken(&state.db, &name, Some(id)).await? {
        return Err(AppError::Conflict("Payment method already exists".to_string()));
    }

    let mut active: payment_method::ActiveModel = existing.into();
    active.name = Set(name);
    active.currency = Set(payload.currency);
    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete_payment_method(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    payment_method::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;

    let expenses = expense::Entity::find()
        .filter(expense::Column::PaymentMethodId.eq(id))
        .count(&state.db)
        .await?;
    in_use("payment method", expenses, "expenses")?;

    payment_method::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(deleted("Payment method"))
}
