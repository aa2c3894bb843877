use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemUser::Table)
                    .if_not_exists()
                    .col(uuid(SystemUser::Id).primary_key())
                    .col(string_len(SystemUser::Username, 50).not_null().unique_key())
                    .col(string_len(SystemUser::PasswordHash, 255).not_null())
                    .col(string_len(SystemUser::Role, 20).not_null())
                    .col(
                        timestamp_with_time_zone(SystemUser::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Session::Table)
                    .if_not_exists()
                    .col(uuid(Session::Id).primary_key())
                    .col(uuid(Session::UserId).not_null())
                    .col(timestamp_with_time_zone(Session::ExpiresAt).not_null())
                    .col(boolean(Session::Active).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(Session::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_user")
                            .from(Session::Table, Session::UserId)
                            .to(SystemUser::Table, SystemUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Session::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SystemUser::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SystemUser {
    Table,
    Id,
    Username,
    PasswordHash,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Session {
    Table,
    Id,
    UserId,
    ExpiresAt,
    Active,
    CreatedAt,
}
