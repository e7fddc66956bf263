use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExternalSystems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExternalSystems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExternalSystems::SystemName)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ExternalSystems::ApiKey)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ExternalSystems::OriginUrls)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalSystems::SubscribedEventCodes)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalSystems::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ExternalSystems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalSystems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExternalSystems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ExternalSystems {
    Table,
    Id,
    SystemName,
    ApiKey,
    OriginUrls,
    SubscribedEventCodes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
