use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiReceiveLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiReceiveLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApiReceiveLogs::ExternalSystemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiReceiveLogs::RequestPath)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ApiReceiveLogs::RequestBody).text().not_null())
                    .col(
                        ColumnDef::new(ApiReceiveLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiReceiveLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ApiReceiveLogs {
    Table,
    Id,
    ExternalSystemId,
    RequestPath,
    RequestBody,
    CreatedAt,
}
