use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeviceStatusLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeviceStatusLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeviceStatusLogs::ExternalSystemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeviceStatusLogs::DeviceId).string().not_null())
                    .col(ColumnDef::new(DeviceStatusLogs::Status).string().not_null())
                    .col(ColumnDef::new(DeviceStatusLogs::Note).string())
                    .col(
                        ColumnDef::new(DeviceStatusLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeviceStatusLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DeviceStatusLogs {
    Table,
    Id,
    ExternalSystemId,
    DeviceId,
    Status,
    Note,
    CreatedAt,
}
