use std::sync::Arc;
use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use dari_broker::{BusPublisher, RetryPolicy, supervise_consumer};
use dari_core::config::Config;
use dari_core::shutdown::{Shutdown, wait_for_signal};
use dari_core::tracing::init_tracing;

use dari_external::broker::{
    DisasterConsumer, LapinReportPublisher, declare_report_exchange, disaster_topology,
};
use dari_external::config::ExternalConfig;
use dari_external::infra::db::{
    DbDisasterTransmitLogRepository, DbExternalSystemRepository, DbMqReceiveLogRepository,
    DbReportPublishLogRepository,
};
use dari_external::router::build_router;
use dari_external::state::AppState;
use dari_external::usecase::disaster_emit::DisasterEmitEngine;
use dari_external::usecase::disaster_fanout::DisasterFanoutUseCase;
use dari_external::usecase::report_publish::ReportPublishEngine;
use dari_external::workers;
use dari_external::ws::WsSessionManager;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = ExternalConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let sessions = Arc::new(WsSessionManager::new());
    let state = AppState {
        db: db.clone(),
        sessions: Arc::clone(&sessions),
    };

    let shutdown = Shutdown::new();

    // Bus publisher for staged reports.
    let broker_connection = dari_broker::connect(&config.broker_url)
        .await
        .expect("failed to connect to broker");
    let publish_channel = broker_connection
        .create_channel()
        .await
        .expect("failed to open broker channel");
    declare_report_exchange(&publish_channel)
        .await
        .expect("failed to declare report exchange");

    let publish_engine = Arc::new(ReportPublishEngine {
        outbox: DbReportPublishLogRepository { db: db.clone() },
        bus: LapinReportPublisher {
            publisher: BusPublisher::new(publish_channel),
        },
        max_retries: config.max_retries,
    });
    let emit_engine = Arc::new(DisasterEmitEngine {
        transmits: DbDisasterTransmitLogRepository { db: db.clone() },
        emitter: Arc::clone(&sessions),
        max_retries: config.max_retries,
        ack_timeout: config.ack_timeout(),
    });

    let publish_worker = tokio::spawn(workers::report_publish::run(
        publish_engine,
        config.poll_period(),
        shutdown.signal(),
    ));
    let transmit_worker = tokio::spawn(workers::disaster_transmit::run(
        emit_engine,
        config.ack_timeout(),
        config.poll_period(),
        shutdown.signal(),
    ));

    // Consume alerts off the bus into per-subscriber rows.
    let consumer = DisasterConsumer {
        usecase: DisasterFanoutUseCase {
            inbox: DbMqReceiveLogRepository { db: db.clone() },
            systems: DbExternalSystemRepository { db: db.clone() },
            transmits: DbDisasterTransmitLogRepository { db: db.clone() },
        },
    };
    let consumer_task = {
        let url = config.broker_url.clone();
        let topology = disaster_topology(config.retry_ttl_ms);
        let policy = RetryPolicy {
            max_retries: config.max_retries as u32,
        };
        let signal = shutdown.signal();
        tokio::spawn(async move {
            supervise_consumer(
                &url,
                &topology,
                "dari-external",
                &consumer,
                policy,
                signal,
                Duration::from_secs(5),
            )
            .await;
        })
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.external_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");
    info!("external service listening on {addr}");

    let mut server_signal = shutdown.signal();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_signal.recv().await })
            .await
            .expect("server error");
    });

    wait_for_signal().await;
    info!("shutting down");
    shutdown.trigger();

    // Workers first (no new sends), then the HTTP/WS surface, then the
    // broker, then the database pool.
    let _ = publish_worker.await;
    let _ = transmit_worker.await;
    let _ = server.await;
    let _ = consumer_task.await;
    let _ = broker_connection.close(0, "shutdown").await;
    let _ = db.close().await;
    info!("external service stopped");
}
