use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StoreEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StoreEntries::Namespace).string().not_null())
                    .col(ColumnDef::new(StoreEntries::Key).string().not_null())
                    .col(ColumnDef::new(StoreEntries::Value).text().not_null())
                    .col(
                        ColumnDef::new(StoreEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(StoreEntries::Namespace)
                            .col(StoreEntries::Key),
                    )
                    .to_owned(),
            )
            .await?;

        // TTL sweeps scan by age
        manager
            .create_index(
                Index::create()
                    .name("idx_store_entries_updated_at")
                    .table(StoreEntries::Table)
                    .col(StoreEntries::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoreEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StoreEntries {
    Table,
    Namespace,
    Key,
    Value,
    UpdatedAt,
}
