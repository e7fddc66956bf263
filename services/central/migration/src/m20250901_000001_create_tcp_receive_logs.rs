use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TcpReceiveLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TcpReceiveLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TcpReceiveLogs::InboundId).string().not_null())
                    .col(
                        ColumnDef::new(TcpReceiveLogs::InboundSeq)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TcpReceiveLogs::RawMessage).text().not_null())
                    .col(ColumnDef::new(TcpReceiveLogs::Status).string().not_null())
                    .col(ColumnDef::new(TcpReceiveLogs::ErrorMessage).string())
                    .col(
                        ColumnDef::new(TcpReceiveLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TcpReceiveLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Dedup key for redelivered frames.
        manager
            .create_index(
                Index::create()
                    .table(TcpReceiveLogs::Table)
                    .col(TcpReceiveLogs::InboundId)
                    .col(TcpReceiveLogs::InboundSeq)
                    .unique()
                    .name("uq_tcp_receive_logs_inbound")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TcpReceiveLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TcpReceiveLogs {
    Table,
    Id,
    InboundId,
    InboundSeq,
    RawMessage,
    Status,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}
