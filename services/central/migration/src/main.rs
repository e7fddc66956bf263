use sea_orm_migration::prelude::*;

mod m20250901_000001_create_tcp_receive_logs;
mod m20250901_000002_create_disaster_publish_logs;
mod m20250901_000003_create_mq_receive_logs;
mod m20250901_000004_create_report_transmit_logs;
mod m20250901_000005_create_connection_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_tcp_receive_logs::Migration),
            Box::new(m20250901_000002_create_disaster_publish_logs::Migration),
            Box::new(m20250901_000003_create_mq_receive_logs::Migration),
            Box::new(m20250901_000004_create_report_transmit_logs::Migration),
            Box::new(m20250901_000005_create_connection_logs::Migration),
        ]
    }
}

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
