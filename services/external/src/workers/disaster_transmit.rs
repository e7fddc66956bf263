use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use dari_core::shutdown::ShutdownSignal;

use crate::domain::repository::DisasterTransmitLogRepository;
use crate::usecase::disaster_emit::DisasterEmitEngine;
use crate::ws::AlertEmitter;

use super::{BATCH_SIZE, CONCURRENCY};

/// Re-drives due delivery rows (fresh PENDING and stale SENT) into the
/// emit engine.
pub async fn run<T, E>(
    engine: Arc<DisasterEmitEngine<T, E>>,
    stale_after: Duration,
    period: Duration,
    mut shutdown: ShutdownSignal,
) where
    T: DisasterTransmitLogRepository,
    E: AlertEmitter,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("disaster transmit worker started");

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {}
        }

        let rows = match engine.transmits.fetch_due(BATCH_SIZE, stale_after).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "disaster transmit poll failed");
                continue;
            }
        };

        let engine = &engine;
        futures::stream::iter(rows)
            .for_each_concurrent(CONCURRENCY, |row| async move {
                if let Err(err) = engine.drive(row.id).await {
                    error!(id = row.id, error = %err, "disaster transmit drive failed");
                }
            })
            .await;
    }
    info!("disaster transmit worker stopped");
}
