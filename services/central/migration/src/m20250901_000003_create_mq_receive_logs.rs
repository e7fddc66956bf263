use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MqReceiveLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MqReceiveLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MqReceiveLogs::RawMessage).text().not_null())
                    .col(ColumnDef::new(MqReceiveLogs::Status).string().not_null())
                    .col(ColumnDef::new(MqReceiveLogs::ErrorMessage).string())
                    .col(
                        ColumnDef::new(MqReceiveLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MqReceiveLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MqReceiveLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MqReceiveLogs {
    Table,
    Id,
    RawMessage,
    Status,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}
