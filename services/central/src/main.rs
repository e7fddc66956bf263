use std::sync::Arc;
use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use dari_broker::{BusPublisher, RetryPolicy, supervise_consumer};
use dari_core::config::Config;
use dari_core::shutdown::{Shutdown, wait_for_signal};
use dari_core::tracing::init_tracing;

use dari_central::broker::{
    LapinAlertPublisher, ReportConsumer, declare_alert_exchange, report_topology,
};
use dari_central::config::CentralConfig;
use dari_central::handlers::LinkHandlers;
use dari_central::infra::db::{
    DbConnectionLogRepository, DbDisasterPublishLogRepository, DbMqReceiveLogRepository,
    DbReportTransmitLogRepository, DbTcpReceiveLogRepository,
};
use dari_central::session::{SessionHandle, driver};
use dari_central::usecase::disaster_intake::DisasterIntakeUseCase;
use dari_central::usecase::disaster_publish::DisasterPublishEngine;
use dari_central::usecase::report_consume::ReportConsumeUseCase;
use dari_central::usecase::report_transmit::ReportTransmitEngine;
use dari_central::workers;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = CentralConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let tcp_inbox = DbTcpReceiveLogRepository { db: db.clone() };
    let publish_outbox = DbDisasterPublishLogRepository { db: db.clone() };
    let mq_inbox = DbMqReceiveLogRepository { db: db.clone() };
    let report_outbox = DbReportTransmitLogRepository { db: db.clone() };
    let connections = DbConnectionLogRepository { db: db.clone() };

    let shutdown = Shutdown::new();

    // Upstream session and the engines hanging off it.
    let session = SessionHandle::new();
    let transmit_engine = Arc::new(ReportTransmitEngine::new(
        report_outbox.clone(),
        publish_outbox.clone(),
        session.clone(),
        config.transmit(),
    ));
    let handlers = Arc::new(LinkHandlers {
        intake: DisasterIntakeUseCase {
            inbox: tcp_inbox,
            outbox: publish_outbox.clone(),
            dest_id: config.cas_dest_id.clone(),
        },
        transmit: Arc::clone(&transmit_engine),
    });
    let session_task = tokio::spawn(driver::run(
        config.session(),
        session.clone(),
        handlers,
        connections,
        shutdown.signal(),
    ));

    // Bus publisher for staged alerts.
    let broker_connection = dari_broker::connect(&config.broker_url)
        .await
        .expect("failed to connect to broker");
    let publish_channel = broker_connection
        .create_channel()
        .await
        .expect("failed to open broker channel");
    declare_alert_exchange(&publish_channel)
        .await
        .expect("failed to declare alert exchange");
    let publish_engine = Arc::new(DisasterPublishEngine {
        outbox: publish_outbox.clone(),
        bus: LapinAlertPublisher {
            publisher: BusPublisher::new(publish_channel),
        },
        max_retries: config.max_retries,
    });

    let publish_worker = tokio::spawn(workers::disaster_publish::run(
        publish_engine,
        config.poll_period(),
        shutdown.signal(),
    ));
    let transmit_worker = tokio::spawn(workers::report_transmit::run(
        Arc::clone(&transmit_engine),
        report_outbox.clone(),
        config.ack_timeout(),
        config.poll_period(),
        shutdown.signal(),
    ));

    // Consume subscriber reports off the bus.
    let consumer = ReportConsumer {
        usecase: ReportConsumeUseCase {
            inbox: mq_inbox,
            outbox: report_outbox,
            publishes: publish_outbox,
            dest_id: config.cas_dest_id.clone(),
        },
    };
    let consumer_task = {
        let url = config.broker_url.clone();
        let topology = report_topology(config.retry_ttl_ms);
        let policy = RetryPolicy {
            max_retries: config.max_retries as u32,
        };
        let signal = shutdown.signal();
        tokio::spawn(async move {
            supervise_consumer(
                &url,
                &topology,
                "dari-central",
                &consumer,
                policy,
                signal,
                Duration::from_secs(5),
            )
            .await;
        })
    };

    info!("central service started");
    wait_for_signal().await;
    info!("shutting down");
    shutdown.trigger();

    // Workers first (no new sends), then the upstream session, then the
    // broker, then the database pool.
    let _ = publish_worker.await;
    let _ = transmit_worker.await;
    let _ = session_task.await;
    let _ = consumer_task.await;
    let _ = broker_connection.close(0, "shutdown").await;
    let _ = db.close().await;
    info!("central service stopped");
}
