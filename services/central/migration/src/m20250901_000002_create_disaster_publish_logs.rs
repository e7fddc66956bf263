use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DisasterPublishLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DisasterPublishLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DisasterPublishLogs::TcpReceiveLogId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterPublishLogs::RoutingKey)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterPublishLogs::Identifier)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DisasterPublishLogs::EventCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterPublishLogs::RawMessage)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DisasterPublishLogs::Status).string().not_null())
                    .col(
                        ColumnDef::new(DisasterPublishLogs::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DisasterPublishLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DisasterPublishLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_disaster_publish_logs_tcp_receive_log")
                            .from(
                                DisasterPublishLogs::Table,
                                DisasterPublishLogs::TcpReceiveLogId,
                            )
                            .to(TcpReceiveLogs::Table, TcpReceiveLogs::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Poll predicate: status scan ordered by created_at.
        manager
            .create_index(
                Index::create()
                    .table(DisasterPublishLogs::Table)
                    .col(DisasterPublishLogs::Status)
                    .col(DisasterPublishLogs::CreatedAt)
                    .name("idx_disaster_publish_logs_status_created")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DisasterPublishLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DisasterPublishLogs {
    Table,
    Id,
    TcpReceiveLogId,
    RoutingKey,
    Identifier,
    EventCode,
    RawMessage,
    Status,
    RetryCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TcpReceiveLogs {
    Table,
    Id,
}
