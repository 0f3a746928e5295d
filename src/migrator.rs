#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_granite_blocks_table::Migration),
            Box::new(m20250301_000002_create_clients_table::Migration),
            Box::new(m20250301_000003_create_invoices_tables::Migration),
            Box::new(m20250301_000004_create_users_table::Migration),
        ]
    }
}

mod m20250301_000001_create_granite_blocks_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_granite_blocks_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GraniteBlocks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GraniteBlocks::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GraniteBlocks::BlockNo)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(GraniteBlocks::PitNo).string())
                        .col(ColumnDef::new(GraniteBlocks::BuyerBlockNo).string())
                        .col(ColumnDef::new(GraniteBlocks::Grade).string().not_null())
                        .col(
                            ColumnDef::new(GraniteBlocks::LengthMm)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GraniteBlocks::WidthMm)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GraniteBlocks::HeightMm)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(GraniteBlocks::Status).string())
                        .col(ColumnDef::new(GraniteBlocks::AllowanceType).string())
                        .col(ColumnDef::new(GraniteBlocks::PreAllowanceMm).decimal_len(19, 4))
                        .col(ColumnDef::new(GraniteBlocks::TonnageAllowance).decimal_len(19, 4))
                        .col(
                            ColumnDef::new(GraniteBlocks::QuarriedOn)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GraniteBlocks::Note).text())
                        .col(
                            ColumnDef::new(GraniteBlocks::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GraniteBlocks::UpdatedAt).timestamp())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_granite_blocks_quarried_on")
                        .table(GraniteBlocks::Table)
                        .col(GraniteBlocks::QuarriedOn)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_granite_blocks_status")
                        .table(GraniteBlocks::Table)
                        .col(GraniteBlocks::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GraniteBlocks::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum GraniteBlocks {
        Table,
        Id,
        BlockNo,
        PitNo,
        BuyerBlockNo,
        Grade,
        LengthMm,
        WidthMm,
        HeightMm,
        Status,
        AllowanceType,
        PreAllowanceMm,
        TonnageAllowance,
        QuarriedOn,
        Note,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_clients_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_clients_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Clients::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Clients::Name).string().not_null())
                        .col(ColumnDef::new(Clients::Gstin).string())
                        .col(ColumnDef::new(Clients::Phone).string())
                        .col(ColumnDef::new(Clients::Country).string())
                        .col(ColumnDef::new(Clients::Address).text())
                        .col(ColumnDef::new(Clients::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Clients::UpdatedAt).timestamp())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Clients {
        Table,
        Id,
        Name,
        Gstin,
        Phone,
        Country,
        Address,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000003_create_invoices_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_invoices_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Invoices::GatePassNo)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Invoices::BillToName).string().not_null())
                        .col(ColumnDef::new(Invoices::BillToAddress).text())
                        .col(ColumnDef::new(Invoices::BillToCountry).string())
                        .col(ColumnDef::new(Invoices::BillToGstin).string())
                        .col(ColumnDef::new(Invoices::BillToPhone).string())
                        .col(ColumnDef::new(Invoices::DispatchDate).date())
                        .col(ColumnDef::new(Invoices::GpType).string())
                        .col(ColumnDef::new(Invoices::Notes).text())
                        .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceLineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceLineItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceLineItems::InvoiceId).uuid().not_null())
                        .col(
                            ColumnDef::new(InvoiceLineItems::LineNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceLineItems::BlockNo).string().not_null())
                        .col(ColumnDef::new(InvoiceLineItems::PitNo).string())
                        .col(ColumnDef::new(InvoiceLineItems::Grade).string().not_null())
                        .col(
                            ColumnDef::new(InvoiceLineItems::LengthMm)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceLineItems::WidthMm)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceLineItems::HeightMm)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceLineItems::QuarryCbm)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceLineItems::DmgTonnage)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceLineItems::GrossVolume)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceLineItems::CustomerTonnage)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceLineItems::NetCbm)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_line_items_invoice_id")
                                .from(InvoiceLineItems::Table, InvoiceLineItems::InvoiceId)
                                .to(Invoices::Table, Invoices::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_invoice_line_items_invoice_id")
                        .table(InvoiceLineItems::Table)
                        .col(InvoiceLineItems::InvoiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InvoiceLineItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Invoices {
        Table,
        Id,
        GatePassNo,
        BillToName,
        BillToAddress,
        BillToCountry,
        BillToGstin,
        BillToPhone,
        DispatchDate,
        GpType,
        Notes,
        CreatedAt,
    }

    #[derive(Iden)]
    enum InvoiceLineItems {
        Table,
        Id,
        InvoiceId,
        LineNumber,
        BlockNo,
        PitNo,
        Grade,
        LengthMm,
        WidthMm,
        HeightMm,
        QuarryCbm,
        DmgTonnage,
        GrossVolume,
        CustomerTonnage,
        NetCbm,
    }
}

mod m20250301_000004_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(
                            ColumnDef::new(Users::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        Role,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}
