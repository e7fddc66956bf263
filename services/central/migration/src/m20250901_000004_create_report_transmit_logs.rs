use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportTransmitLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportTransmitLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReportTransmitLogs::MqReceiveLogId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportTransmitLogs::Type).string().not_null())
                    .col(
                        ColumnDef::new(ReportTransmitLogs::OutboundId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportTransmitLogs::ExternalSystemName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportTransmitLogs::RawMessage)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportTransmitLogs::Status).string().not_null())
                    .col(
                        ColumnDef::new(ReportTransmitLogs::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReportTransmitLogs::ReportSequence)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(ReportTransmitLogs::ErrorDetail).string())
                    .col(
                        ColumnDef::new(ReportTransmitLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportTransmitLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_transmit_logs_mq_receive_log")
                            .from(
                                ReportTransmitLogs::Table,
                                ReportTransmitLogs::MqReceiveLogId,
                            )
                            .to(MqReceiveLogs::Table, MqReceiveLogs::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Ack correlation lookup.
        manager
            .create_index(
                Index::create()
                    .table(ReportTransmitLogs::Table)
                    .col(ReportTransmitLogs::OutboundId)
                    .col(ReportTransmitLogs::ReportSequence)
                    .name("idx_report_transmit_logs_outbound")
                    .to_owned(),
            )
            .await?;

        // Poll predicate: status scan ordered by created_at.
        manager
            .create_index(
                Index::create()
                    .table(ReportTransmitLogs::Table)
                    .col(ReportTransmitLogs::Status)
                    .col(ReportTransmitLogs::CreatedAt)
                    .name("idx_report_transmit_logs_status_created")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportTransmitLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportTransmitLogs {
    Table,
    Id,
    MqReceiveLogId,
    Type,
    OutboundId,
    ExternalSystemName,
    RawMessage,
    Status,
    RetryCount,
    ReportSequence,
    ErrorDetail,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum MqReceiveLogs {
    Table,
    Id,
}
