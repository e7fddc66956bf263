use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DisasterTransmitLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::MqReceiveLogId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::ExternalSystemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::Identifier)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::RawMessage)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterTransmitLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disaster_transmit_logs_external_system")
                            .from(
                                DisasterTransmitLogs::Table,
                                DisasterTransmitLogs::ExternalSystemId,
                            )
                            .to(ExternalSystems::Table, ExternalSystems::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disaster_transmit_logs_mq_receive_log")
                            .from(
                                DisasterTransmitLogs::Table,
                                DisasterTransmitLogs::MqReceiveLogId,
                            )
                            .to(MqReceiveLogs::Table, MqReceiveLogs::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One delivery row per alert per subscriber.
        manager
            .create_index(
                Index::create()
                    .table(DisasterTransmitLogs::Table)
                    .col(DisasterTransmitLogs::ExternalSystemId)
                    .col(DisasterTransmitLogs::Identifier)
                    .unique()
                    .name("uq_disaster_transmit_logs_system_identifier")
                    .to_owned(),
            )
            .await?;

        // Poll predicate: status scan ordered by created_at.
        manager
            .create_index(
                Index::create()
                    .table(DisasterTransmitLogs::Table)
                    .col(DisasterTransmitLogs::Status)
                    .col(DisasterTransmitLogs::CreatedAt)
                    .name("idx_disaster_transmit_logs_status_created")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DisasterTransmitLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DisasterTransmitLogs {
    Table,
    Id,
    MqReceiveLogId,
    ExternalSystemId,
    Identifier,
    RawMessage,
    Status,
    RetryCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ExternalSystems {
    Table,
    Id,
}

#[derive(Iden)]
enum MqReceiveLogs {
    Table,
    Id,
}
