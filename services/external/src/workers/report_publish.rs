use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use dari_core::shutdown::ShutdownSignal;

use crate::domain::repository::ReportPublishLogRepository;
use crate::usecase::report_publish::{ReportBusPublisher, ReportPublishEngine};

use super::{BATCH_SIZE, CONCURRENCY};

/// Drains the report-publish outbox onto the bus.
pub async fn run<R, P>(
    engine: Arc<ReportPublishEngine<R, P>>,
    period: Duration,
    mut shutdown: ShutdownSignal,
) where
    R: ReportPublishLogRepository,
    P: ReportBusPublisher,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("report publish worker started");

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {}
        }

        let rows = match engine.outbox.fetch_pending(BATCH_SIZE).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "report publish poll failed");
                continue;
            }
        };

        let engine = &engine;
        futures::stream::iter(rows)
            .for_each_concurrent(CONCURRENCY, |row| async move {
                let id = row.id;
                if let Err(err) = engine.drive(row).await {
                    error!(id, error = %err, "report publish drive failed");
                }
            })
            .await;
    }
    info!("report publish worker stopped");
}
