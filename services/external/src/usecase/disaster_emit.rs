use std::time::Duration;

use tracing::{debug, warn};

use dari_domain::status::DeliveryStatus;

use crate::domain::repository::DisasterTransmitLogRepository;
use crate::error::ExternalError;
use crate::ws::{AlertEmitter, DisasterEvent, EmitOutcome};

/// Reliable per-subscriber delivery over the live socket.
///
/// One in-flight send per row: the row flips to SENT before the emit and
/// the poll query skips fresh SENT rows, so only this engine's own failure
/// path can put a row back into play.
pub struct DisasterEmitEngine<T: DisasterTransmitLogRepository, E: AlertEmitter> {
    pub transmits: T,
    pub emitter: E,
    pub max_retries: i32,
    pub ack_timeout: Duration,
}

impl<T: DisasterTransmitLogRepository, E: AlertEmitter> DisasterEmitEngine<T, E> {
    pub async fn drive(&self, id: i64) -> Result<(), ExternalError> {
        // Re-read: the row may have settled since the poll selected it.
        let Some(row) = self.transmits.find(id).await? else {
            return Ok(());
        };
        if row.status.is_terminal() {
            return Ok(());
        }

        if row.retry_count >= self.max_retries {
            self.transmits.mark_failed(row.id).await?;
            return Ok(());
        }

        if !self.emitter.is_connected(row.external_system_id) {
            // Subscriber offline: leave the row for a later poll, and put a
            // stale SENT (timer lost to a restart) back to PENDING.
            if row.status == DeliveryStatus::Sent {
                self.transmits.mark_retry_pending(row.id).await?;
            }
            return Ok(());
        }

        self.transmits.mark_sent(row.id).await?;
        let outcome = self
            .emitter
            .emit(
                row.external_system_id,
                DisasterEvent {
                    log_id: row.id,
                    identifier: row.identifier.clone(),
                    raw_message: row.raw_message.clone(),
                },
                self.ack_timeout,
            )
            .await;

        match outcome {
            EmitOutcome::Ack => {
                self.transmits.mark_success(row.id).await?;
            }
            EmitOutcome::NoSocket => {
                // Socket vanished between the check and the emit; nothing
                // went out, so no retry is charged.
                self.transmits.mark_retry_pending(row.id).await?;
            }
            EmitOutcome::Nack(reason) => {
                debug!(id = row.id, %reason, "delivery nacked");
                self.process_failure(row.id).await?;
            }
            EmitOutcome::Timeout => {
                warn!(id = row.id, "delivery ack timed out");
                self.process_failure(row.id).await?;
            }
        }
        Ok(())
    }

    async fn process_failure(&self, id: i64) -> Result<(), ExternalError> {
        let Some(row) = self.transmits.find(id).await? else {
            return Ok(());
        };
        if row.status.is_terminal() {
            return Ok(());
        }
        let Some(retry_count) = self.transmits.bump_retry(id).await? else {
            return Ok(());
        };
        if retry_count > self.max_retries {
            self.transmits.mark_failed(id).await?;
        } else {
            self.transmits.mark_retry_pending(id).await?;
        }
        Ok(())
    }
}
