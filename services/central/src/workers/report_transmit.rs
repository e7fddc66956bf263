use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use dari_core::shutdown::ShutdownSignal;

use crate::domain::repository::{DisasterPublishLogRepository, ReportTransmitLogRepository};
use crate::usecase::report_transmit::{FrameSink, ReportTransmitEngine};

use super::{BATCH_SIZE, CONCURRENCY};

/// Re-drives due report outbox rows (fresh PENDING and stale SENT) into the
/// transmit engine.
pub async fn run<R, P, S>(
    engine: Arc<ReportTransmitEngine<R, P, S>>,
    outbox: R,
    stale_after: Duration,
    period: Duration,
    mut shutdown: ShutdownSignal,
) where
    R: ReportTransmitLogRepository + 'static,
    P: DisasterPublishLogRepository + 'static,
    S: FrameSink + 'static,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("report transmit worker started");

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {}
        }

        let rows = match outbox.fetch_due(BATCH_SIZE, stale_after).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "report transmit poll failed");
                continue;
            }
        };

        let engine = &engine;
        futures::stream::iter(rows)
            .for_each_concurrent(CONCURRENCY, |row| async move {
                let id = row.id;
                if let Err(err) = Arc::clone(engine).drive(row).await {
                    error!(id, error = %err, "report transmit drive failed");
                }
            })
            .await;
    }
    info!("report transmit worker stopped");
}
