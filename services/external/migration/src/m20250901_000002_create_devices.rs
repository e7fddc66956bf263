use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Devices::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Devices::ExternalSystemId).uuid().not_null())
                    .col(ColumnDef::new(Devices::DeviceId).string().not_null())
                    .col(ColumnDef::new(Devices::Type).string().not_null())
                    .col(ColumnDef::new(Devices::Name).string().not_null())
                    .col(ColumnDef::new(Devices::ServerIp).string())
                    .col(ColumnDef::new(Devices::ServerName).string())
                    .col(ColumnDef::new(Devices::Model).string())
                    .col(ColumnDef::new(Devices::Lat).double())
                    .col(ColumnDef::new(Devices::Lon).double())
                    .col(ColumnDef::new(Devices::Address).string())
                    .col(ColumnDef::new(Devices::Note).string())
                    .col(
                        ColumnDef::new(Devices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Devices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_devices_external_system")
                            .from(Devices::Table, Devices::ExternalSystemId)
                            .to(ExternalSystems::Table, ExternalSystems::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Upsert key for device reports.
        manager
            .create_index(
                Index::create()
                    .table(Devices::Table)
                    .col(Devices::ExternalSystemId)
                    .col(Devices::DeviceId)
                    .unique()
                    .name("uq_devices_system_device")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Devices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Devices {
    Table,
    Id,
    ExternalSystemId,
    DeviceId,
    Type,
    Name,
    ServerIp,
    ServerName,
    Model,
    Lat,
    Lon,
    Address,
    Note,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ExternalSystems {
    Table,
    Id,
}
