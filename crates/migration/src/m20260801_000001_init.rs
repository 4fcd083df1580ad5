//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: authentication
//! - `groups`: bill containers with an embedded member list
//! - `bills`: charges raised inside a group (payer/product lists embedded
//!   as JSON, document-style)
//! - `payments`: settlement records generated per bill

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    Email,
    FullName,
    PhoneNumber,
    RevolutId,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
    Description,
    OwnerId,
    MemberIds,
}

#[derive(Iden)]
enum Bills {
    Table,
    Id,
    GroupId,
    OwnerId,
    Name,
    Description,
    BillType,
    Date,
    Payers,
    Products,
    InitialPayers,
    PaymentIds,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    BillId,
    AmountMinor,
    PayerId,
    RecipientId,
    Date,
    Method,
    Status,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::FullName).string())
                    .col(ColumnDef::new(Users::PhoneNumber).string())
                    .col(ColumnDef::new(Users::RevolutId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .col(ColumnDef::new(Groups::Description).string().not_null())
                    .col(ColumnDef::new(Groups::OwnerId).string().not_null())
                    .col(ColumnDef::new(Groups::MemberIds).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-groups-owner_id")
                            .from(Groups::Table, Groups::OwnerId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-groups-name-unique")
                    .table(Groups::Table)
                    .col(Groups::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bills::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Bills::GroupId).string().not_null())
                    .col(ColumnDef::new(Bills::OwnerId).string().not_null())
                    .col(ColumnDef::new(Bills::Name).string().not_null())
                    .col(ColumnDef::new(Bills::Description).string().not_null())
                    .col(ColumnDef::new(Bills::BillType).string().not_null())
                    .col(ColumnDef::new(Bills::Date).timestamp().not_null())
                    .col(ColumnDef::new(Bills::Payers).text().not_null())
                    .col(ColumnDef::new(Bills::Products).text().not_null())
                    .col(ColumnDef::new(Bills::InitialPayers).text().not_null())
                    .col(ColumnDef::new(Bills::PaymentIds).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bills-group_id")
                            .from(Bills::Table, Bills::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bills-group_id-date")
                    .table(Bills::Table)
                    .col(Bills::GroupId)
                    .col(Bills::Date)
                    .to_owned(),
            )
            .await?;

        // Payments carry no bill foreign key: reversal records outlive the
        // bill they came from.
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::BillId).string())
                    .col(
                        ColumnDef::new(Payments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::PayerId).string().not_null())
                    .col(ColumnDef::new(Payments::RecipientId).string().not_null())
                    .col(ColumnDef::new(Payments::Date).timestamp().not_null())
                    .col(ColumnDef::new(Payments::Method).string().not_null())
                    .col(ColumnDef::new(Payments::Status).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-bill_id")
                    .table(Payments::Table)
                    .col(Payments::BillId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-payer_id")
                    .table(Payments::Table)
                    .col(Payments::PayerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-recipient_id")
                    .table(Payments::Table)
                    .col(Payments::RecipientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
