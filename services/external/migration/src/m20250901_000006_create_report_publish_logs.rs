use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportPublishLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportPublishLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportPublishLogs::Type).string().not_null())
                    .col(
                        ColumnDef::new(ReportPublishLogs::ExternalSystemName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportPublishLogs::ApiReceiveLogId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportPublishLogs::RoutingKey)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportPublishLogs::RawMessage).text().not_null())
                    .col(ColumnDef::new(ReportPublishLogs::Status).string().not_null())
                    .col(
                        ColumnDef::new(ReportPublishLogs::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReportPublishLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportPublishLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_publish_logs_api_receive_log")
                            .from(
                                ReportPublishLogs::Table,
                                ReportPublishLogs::ApiReceiveLogId,
                            )
                            .to(ApiReceiveLogs::Table, ApiReceiveLogs::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Poll predicate: status scan ordered by created_at.
        manager
            .create_index(
                Index::create()
                    .table(ReportPublishLogs::Table)
                    .col(ReportPublishLogs::Status)
                    .col(ReportPublishLogs::CreatedAt)
                    .name("idx_report_publish_logs_status_created")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportPublishLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportPublishLogs {
    Table,
    Id,
    Type,
    ExternalSystemName,
    ApiReceiveLogId,
    RoutingKey,
    RawMessage,
    Status,
    RetryCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ApiReceiveLogs {
    Table,
    Id,
}
