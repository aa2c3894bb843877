use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join row between a vehicle record and a selected extra service. `price` is
/// the extra's price when the record was saved.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicle_record_extra")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub record_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub extra_service_id: i32,
    pub price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle_record::Entity",
        from = "Column::RecordId",
        to = "super::vehicle_record::Column::Id"
    )]
    Record,
    #[sea_orm(
        belongs_to = "super::extra_service::Entity",
        from = "Column::ExtraServiceId",
        to = "super::extra_service::Column::Id"
    )]
    ExtraService,
}

impl Related<super::vehicle_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Record.def()
    }
}

impl Related<super::extra_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExtraService.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
