use sea_orm_migration::prelude::*;

mod m20250901_000001_create_external_systems;
mod m20250901_000002_create_devices;
mod m20250901_000003_create_api_receive_logs;
mod m20250901_000004_create_mq_receive_logs;
mod m20250901_000005_create_disaster_transmit_logs;
mod m20250901_000006_create_report_publish_logs;
mod m20250901_000007_create_device_status_logs;
mod m20250901_000008_create_connection_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_external_systems::Migration),
            Box::new(m20250901_000002_create_devices::Migration),
            Box::new(m20250901_000003_create_api_receive_logs::Migration),
            Box::new(m20250901_000004_create_mq_receive_logs::Migration),
            Box::new(m20250901_000005_create_disaster_transmit_logs::Migration),
            Box::new(m20250901_000006_create_report_publish_logs::Migration),
            Box::new(m20250901_000007_create_device_status_logs::Migration),
            Box::new(m20250901_000008_create_connection_logs::Migration),
        ]
    }
}

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
