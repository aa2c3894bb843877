use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "extra_service")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vehicle_record_extra::Entity")]
    RecordExtras,
}

impl Related<super::vehicle_record_extra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecordExtras.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
