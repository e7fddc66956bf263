use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConnectionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConnectionLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConnectionLogs::ExternalSystemId).uuid())
                    .col(ColumnDef::new(ConnectionLogs::Event).string().not_null())
                    .col(ColumnDef::new(ConnectionLogs::Detail).string())
                    .col(
                        ColumnDef::new(ConnectionLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConnectionLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ConnectionLogs {
    Table,
    Id,
    ExternalSystemId,
    Event,
    Detail,
    CreatedAt,
}
