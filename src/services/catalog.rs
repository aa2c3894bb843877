use std::collections::HashMap;

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entities::{category, extra_service, service, vehicle_type};
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogService {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub category_id: i32,
    pub category: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogVehicleType {
    pub id: i32,
    pub name: String,
    pub category_id: i32,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogExtra {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

/// Everything a registration form can pick from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub vehicle_types: Vec<CatalogVehicleType>,
    pub services: Vec<CatalogService>,
    pub extras: Vec<CatalogExtra>,
}

/// Services whose category tag equals `category` exactly.
pub fn filter_by_category(services: &[CatalogService], category: &str) -> Vec<CatalogService> {
    services
        .iter()
        .filter(|s| s.category == category)
        .cloned()
        .collect()
}

impl Catalog {
    pub fn vehicle_type(&self, id: i32) -> Option<&CatalogVehicleType> {
        self.vehicle_types.iter().find(|v| v.id == id)
    }

    pub fn service(&self, id: i32) -> Option<&CatalogService> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn extra(&self, id: i32) -> Option<&CatalogExtra> {
        self.extras.iter().find(|e| e.id == id)
    }

    pub fn services_for(&self, vehicle_type_id: i32) -> Vec<CatalogService> {
        match self.vehicle_type(vehicle_type_id) {
            Some(vt) => filter_by_category(&self.services, &vt.category),
            None => Vec::new(),
        }
    }

    /// Keep `selected` only if it is still offered for `vehicle_type_id`.
    pub fn retain_service(&self, vehicle_type_id: Option<i32>, selected: Option<i32>) -> Option<i32> {
        let (vt, id) = (vehicle_type_id?, selected?);
        self.services_for(vt)
            .iter()
            .any(|s| s.id == id)
            .then_some(id)
    }
}

pub async fn load(db: &DatabaseConnection) -> AppResult<Catalog> {
    let categories: HashMap<i32, String> = category::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let category_name = |id: i32| categories.get(&id).cloned().unwrap_or_default();

    let vehicle_types = vehicle_type::Entity::find()
        .order_by_asc(vehicle_type::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|v| CatalogVehicleType {
            id: v.id,
            category: category_name(v.category_id),
            category_id: v.category_id,
            name: v.name,
        })
        .collect();

    let services = service::Entity::find()
        .order_by_asc(service::Column::Price)
        .all(db)
        .await?
        .into_iter()
        .map(|s| CatalogService {
            id: s.id,
            category: category_name(s.category_id),
            category_id: s.category_id,
            name: s.name,
            price: s.price,
            description: s.description,
        })
        .collect();

    let extras = extra_service::Entity::find()
        .order_by_asc(extra_service::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|e| CatalogExtra {
            id: e.id,
            name: e.name,
            price: e.price,
            description: e.description,
        })
        .collect();

    Ok(Catalog {
        vehicle_types,
        services,
        extras,
    })
}
