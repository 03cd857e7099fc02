use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_master_tables::Migration),
            Box::new(m20240301_000002_create_inventories_table::Migration),
            Box::new(m20240301_000003_create_inventory_movements_table::Migration),
            Box::new(m20240301_000004_create_transfer_in_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_master_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_master_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Storages::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Storages::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Storages::Code).string().not_null())
                        .col(ColumnDef::new(Storages::Name).string().not_null())
                        .col(ColumnDef::new(Storages::Address).string().null())
                        .col(ColumnDef::new(Storages::Phone).string().null())
                        .col(
                            ColumnDef::new(Storages::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Storages::CreatedBy).string().not_null())
                        .col(ColumnDef::new(Storages::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Storages::UpdatedBy).string().null())
                        .col(ColumnDef::new(Storages::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_storages_code")
                        .table(Storages::Table)
                        .col(Storages::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Items::Code).string().not_null())
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::Uom).string().null())
                        .col(ColumnDef::new(Items::Price).decimal_len(19, 4).null())
                        .col(
                            ColumnDef::new(Items::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Items::CreatedBy).string().not_null())
                        .col(ColumnDef::new(Items::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Items::UpdatedBy).string().null())
                        .col(ColumnDef::new(Items::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_code")
                        .table(Items::Table)
                        .col(Items::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Code).string().not_null())
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Contact).string().null())
                        .col(
                            ColumnDef::new(Suppliers::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Suppliers::CreatedBy).string().not_null())
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Suppliers::UpdatedBy).string().null())
                        .col(ColumnDef::new(Suppliers::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Storages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Storages {
        Table,
        Id,
        Code,
        Name,
        Address,
        Phone,
        Deleted,
        CreatedBy,
        CreatedAt,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
        Code,
        Name,
        Uom,
        Price,
        Deleted,
        CreatedBy,
        CreatedAt,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Code,
        Name,
        Contact,
        Deleted,
        CreatedBy,
        CreatedAt,
        UpdatedBy,
        UpdatedAt,
    }
}

mod m20240301_000002_create_inventories_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_inventories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Inventories::StorageId).uuid().not_null())
                        .col(ColumnDef::new(Inventories::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(Inventories::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventories::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Inventories::CreatedBy).string().not_null())
                        .col(
                            ColumnDef::new(Inventories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Inventories::UpdatedBy).string().null())
                        .col(
                            ColumnDef::new(Inventories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One row per (storage, item) pair; get-or-create relies on this.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_inventories_storage_item")
                        .table(Inventories::Table)
                        .col(Inventories::StorageId)
                        .col(Inventories::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventories_item_id")
                        .table(Inventories::Table)
                        .col(Inventories::ItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Inventories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Inventories {
        Table,
        Id,
        StorageId,
        ItemId,
        Quantity,
        Deleted,
        CreatedBy,
        CreatedAt,
        UpdatedBy,
        UpdatedAt,
    }
}

mod m20240301_000003_create_inventory_movements_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_inventory_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::InventoryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::MovementDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ReferenceNo)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::StorageId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityBefore)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::Remark).string().null())
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedBy)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_inventory_id")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::InventoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_reference_no")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::ReferenceNo)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryMovements {
        Table,
        Id,
        InventoryId,
        MovementDate,
        ReferenceNo,
        MovementType,
        StorageId,
        ItemId,
        QuantityBefore,
        Quantity,
        QuantityAfter,
        Remark,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240301_000004_create_transfer_in_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_transfer_in_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TransferInDocs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TransferInDocs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferInDocs::Code).string().not_null())
                        .col(
                            ColumnDef::new(TransferInDocs::TransferDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferInDocs::SourceId).uuid().not_null())
                        .col(
                            ColumnDef::new(TransferInDocs::DestinationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferInDocs::Remark).string().null())
                        .col(
                            ColumnDef::new(TransferInDocs::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(TransferInDocs::CreatedBy)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TransferInDocs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferInDocs::UpdatedBy).string().null())
                        .col(
                            ColumnDef::new(TransferInDocs::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Code uniqueness is enforced in validation so a soft-deleted
            // document does not block reuse of its code.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transfer_in_docs_code")
                        .table(TransferInDocs::Table)
                        .col(TransferInDocs::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TransferInItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TransferInItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferInItems::DocId).uuid().not_null())
                        .col(
                            ColumnDef::new(TransferInItems::LineNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferInItems::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(TransferInItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TransferInItems::Remark).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transfer_in_items_doc_id")
                        .table(TransferInItems::Table)
                        .col(TransferInItems::DocId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TransferInItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TransferInDocs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TransferInDocs {
        Table,
        Id,
        Code,
        TransferDate,
        SourceId,
        DestinationId,
        Remark,
        Deleted,
        CreatedBy,
        CreatedAt,
        UpdatedBy,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum TransferInItems {
        Table,
        Id,
        DocId,
        LineNumber,
        ItemId,
        Quantity,
        Remark,
    }
}
