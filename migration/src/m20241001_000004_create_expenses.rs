use sea_orm_migration::{prelude::*, schema::*};

use super::m20241001_000001_create_catalog::PaymentMethod;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expense::Table)
                    .if_not_exists()
                    .col(uuid(Expense::Id).primary_key())
                    .col(string_len(Expense::Description, 255).not_null())
                    .col(double(Expense::Amount).not_null())
                    .col(string_len(Expense::Currency, 10).not_null())
                    .col(double(Expense::ExchangeRate).not_null())
                    .col(double(Expense::AmountUsd).not_null())
                    .col(double(Expense::AmountLocal).not_null())
                    .col(integer_null(Expense::PaymentMethodId))
                    .col(text_null(Expense::Notes))
                    .col(
                        timestamp_with_time_zone(Expense::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Expense::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_payment_method")
                            .from(Expense::Table, Expense::PaymentMethodId)
                            .to(PaymentMethod::Table, PaymentMethod::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expense::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Expense {
    Table,
    Id,
    Description,
    Amount,
    Currency,
    ExchangeRate,
    AmountUsd,
    AmountLocal,
    PaymentMethodId,
    Notes,
    CreatedAt,
    UpdatedAt,
}
