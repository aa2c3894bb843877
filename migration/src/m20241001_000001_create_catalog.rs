use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(pk_auto(Category::Id))
                    .col(string_len(Category::Name, 50).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VehicleType::Table)
                    .if_not_exists()
                    .col(pk_auto(VehicleType::Id))
                    .col(string_len(VehicleType::Name, 50).not_null().unique_key())
                    .col(integer(VehicleType::CategoryId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_type_category")
                            .from(VehicleType::Table, VehicleType::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Service::Table)
                    .if_not_exists()
                    .col(pk_auto(Service::Id))
                    .col(string_len(Service::Name, 100).not_null().unique_key())
                    .col(double(Service::Price).not_null())
                    .col(integer(Service::CategoryId).not_null())
                    .col(string_len_null(Service::Description, 255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_category")
                            .from(Service::Table, Service::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExtraService::Table)
                    .if_not_exists()
                    .col(pk_auto(ExtraService::Id))
                    .col(string_len(ExtraService::Name, 100).not_null().unique_key())
                    .col(double(ExtraService::Price).not_null())
                    .col(string_len_null(ExtraService::Description, 255))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentMethod::Table)
                    .if_not_exists()
                    .col(pk_auto(PaymentMethod::Id))
                    .col(string_len(PaymentMethod::Name, 50).not_null().unique_key())
                    .col(string_len(PaymentMethod::Currency, 10).not_null())
                    .to_owned(),
            )
            .await?;

        // Seed catalog
        let categories = Query::insert()
            .into_table(Category::Table)
            .columns([Category::Name])
            .values_panic(["Sedan".into()])
            .values_panic(["Camioneta".into()])
            .to_owned();
        manager.exec_stmt(categories).await?;

        let vehicle_types = Query::insert()
            .into_table(VehicleType::Table)
            .columns([VehicleType::Name, VehicleType::CategoryId])
            .values_panic(["Sedan".into(), 1.into()])
            .values_panic(["Coupe".into(), 1.into()])
            .values_panic(["Hatchback".into(), 1.into()])
            .values_panic(["Camioneta".into(), 2.into()])
            .values_panic(["Pickup".into(), 2.into()])
            .to_owned();
        manager.exec_stmt(vehicle_types).await?;

        let services = Query::insert()
            .into_table(Service::Table)
            .columns([Service::Name, Service::Price, Service::CategoryId])
            .values_panic(["Sencillo Sedan".into(), (6.0).into(), 1.into()])
            .values_panic(["Full Sedan".into(), (10.0).into(), 1.into()])
            .values_panic(["Sencillo Camioneta".into(), (8.0).into(), 2.into()])
            .values_panic(["Full Camioneta".into(), (12.0).into(), 2.into()])
            .to_owned();
        manager.exec_stmt(services).await?;

        let extras = Query::insert()
            .into_table(ExtraService::Table)
            .columns([ExtraService::Name, ExtraService::Price])
            .values_panic(["Encerado".into(), (15.0).into()])
            .values_panic(["Lavado de motor".into(), (5.0).into()])
            .values_panic(["Tapiceria".into(), (20.0).into()])
            .to_owned();
        manager.exec_stmt(extras).await?;

        let payment_methods = Query::insert()
            .into_table(PaymentMethod::Table)
            .columns([PaymentMethod::Name, PaymentMethod::Currency])
            .values_panic(["Efectivo USD".into(), "usd".into()])
            .values_panic(["Zelle".into(), "usd".into()])
            .values_panic(["Pago Movil".into(), "local".into()])
            .values_panic(["Efectivo Bs".into(), "local".into()])
            .to_owned();
        manager.exec_stmt(payment_methods).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentMethod::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExtraService::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Service::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VehicleType::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Category {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub enum VehicleType {
    Table,
    Id,
    Name,
    CategoryId,
}

#[derive(DeriveIden)]
pub enum Service {
    Table,
    Id,
    Name,
    Price,
    CategoryId,
    Description,
}

#[derive(DeriveIden)]
pub enum ExtraService {
    Table,
    Id,
    Name,
    Price,
    Description,
}

#[derive(DeriveIden)]
pub enum PaymentMethod {
    Table,
    Id,
    Name,
    Currency,
}
