use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entities::vehicle_record;
use crate::error::{AppError, AppResult};
use crate::utils::plate::{is_lookup_ready, normalize_plate, MIN_PLATE_LEN};

/// Client details remembered from the last visit of a plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_name: String,
    pub national_id: String,
    pub phone: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateLookup {
    pub found: bool,
    pub client_info: Option<ClientInfo>,
    pub vehicle_type_id: Option<i32>,
}

impl PlateLookup {
    pub fn not_found() -> Self {
        Self {
            found: false,
            client_info: None,
            vehicle_type_id: None,
        }
    }
}

impl From<vehicle_record::Model> for PlateLookup {
    fn from(record: vehicle_record::Model) -> Self {
        Self {
            found: true,
            vehicle_type_id: Some(record.vehicle_type_id),
            client_info: Some(ClientInfo {
                client_name: record.client_name,
                national_id: record.national_id,
                phone: record.phone,
                color: record.color,
            }),
        }
    }
}

#[async_trait]
pub trait VehicleLookup: Send + Sync {
    async fn lookup(&self, plate: &str) -> AppResult<PlateLookup>;
}

/// Most recent record for `plate`. Unknown plates are a normal result.
pub async fn find_latest_by_plate(db: &DatabaseConnection, plate: &str) -> AppResult<PlateLookup> {
    let plate = normalize_plate(plate);
    if !is_lookup_ready(&plate) {
        return Err(AppError::BadRequest(format!(
            "Plate must have at least {} characters",
            MIN_PLATE_LEN
        )));
    }

    let latest = vehicle_record::Entity::find()
        .filter(vehicle_record::Column::Plate.eq(&plate))
        .order_by_desc(vehicle_record::Column::CreatedAt)
        .one(db)
        .await?;

    Ok(latest.map(PlateLookup::from).unwrap_or_else(PlateLookup::not_found))
}

#[async_trait]
impl VehicleLookup for DatabaseConnection {
    async fn lookup(&self, plate: &str) -> AppResult<PlateLookup> {
        find_latest_by_plate(self, plate).await
    }
}
