use sea_orm_migration::{prelude::*, schema::*};

use super::m20241001_000001_create_catalog::{ExtraService, Service, VehicleType};
use super::m20241001_000002_create_users::SystemUser;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VehicleRecord::Table)
                    .if_not_exists()
                    .col(uuid(VehicleRecord::Id).primary_key())
                    .col(string_len(VehicleRecord::ClientName, 100).not_null())
                    .col(string_len(VehicleRecord::NationalId, 20).not_null())
                    .col(string_len(VehicleRecord::Phone, 20).not_null())
                    .col(string_len(VehicleRecord::Plate, 8).not_null())
                    .col(string_len(VehicleRecord::Color, 30).not_null())
                    .col(integer(VehicleRecord::VehicleTypeId).not_null())
                    .col(integer(VehicleRecord::ServiceId).not_null())
                    .col(string_len(VehicleRecord::CarStatus, 20).not_null())
                    .col(string_len(VehicleRecord::PaymentStatus, 20).not_null())
                    .col(double(VehicleRecord::TotalUsd).not_null())
                    .col(double_null(VehicleRecord::TotalLocal))
                    .col(double_null(VehicleRecord::ExchangeRate))
                    .col(string_len_null(VehicleRecord::PaymentReference, 100))
                    .col(text_null(VehicleRecord::Notes))
                    .col(uuid_null(VehicleRecord::CreatedBy))
                    .col(
                        timestamp_with_time_zone(VehicleRecord::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(VehicleRecord::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_record_vehicle_type")
                            .from(VehicleRecord::Table, VehicleRecord::VehicleTypeId)
                            .to(VehicleType::Table, VehicleType::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_record_service")
                            .from(VehicleRecord::Table, VehicleRecord::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_record_created_by")
                            .from(VehicleRecord::Table, VehicleRecord::CreatedBy)
                            .to(SystemUser::Table, SystemUser::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicle_record_plate")
                    .table(VehicleRecord::Table)
                    .col(VehicleRecord::Plate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VehicleRecordExtra::Table)
                    .if_not_exists()
                    .col(uuid(VehicleRecordExtra::RecordId).not_null())
                    .col(integer(VehicleRecordExtra::ExtraServiceId).not_null())
                    .col(double(VehicleRecordExtra::Price).not_null())
                    .primary_key(
                        Index::create()
                            .col(VehicleRecordExtra::RecordId)
                            .col(VehicleRecordExtra::ExtraServiceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_record_extra_record")
                            .from(VehicleRecordExtra::Table, VehicleRecordExtra::RecordId)
                            .to(VehicleRecord::Table, VehicleRecord::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_record_extra_extra_service")
                            .from(VehicleRecordExtra::Table, VehicleRecordExtra::ExtraServiceId)
                            .to(ExtraService::Table, ExtraService::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VehicleRecordExtra::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(VehicleRecord::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum VehicleRecord {
    Table,
    Id,
    ClientName,
    NationalId,
    Phone,
    Plate,
    Color,
    VehicleTypeId,
    ServiceId,
    CarStatus,
    PaymentStatus,
    TotalUsd,
    TotalLocal,
    ExchangeRate,
    PaymentReference,
    Notes,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum VehicleRecordExtra {
    Table,
    RecordId,
    ExtraServiceId,
    Price,
}
