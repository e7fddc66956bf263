use tracing::warn;

use dari_domain::payload::DisasterMessage;

use crate::domain::repository::DisasterPublishLogRepository;
use crate::domain::types::DisasterPublishRow;
use crate::error::CentralError;

/// Seam over the bus so the engine is testable without a broker.
#[allow(async_fn_in_trait)]
pub trait AlertBusPublisher: Send + Sync {
    async fn publish_alert(
        &self,
        routing_key: &str,
        message: &DisasterMessage,
    ) -> Result<(), anyhow::Error>;
}

/// Pushes staged alerts onto the bus and settles their outbox rows.
pub struct DisasterPublishEngine<R: DisasterPublishLogRepository, P: AlertBusPublisher> {
    pub outbox: R,
    pub bus: P,
    pub max_retries: i32,
}

impl<R: DisasterPublishLogRepository, P: AlertBusPublisher> DisasterPublishEngine<R, P> {
    pub async fn drive(&self, row: DisasterPublishRow) -> Result<(), CentralError> {
        if row.status.is_terminal() {
            return Ok(());
        }

        let message = DisasterMessage {
            identifier: row.identifier.clone(),
            event_code: row.event_code.clone(),
            raw_message: row.raw_message.clone(),
        };

        match self.bus.publish_alert(&row.routing_key, &message).await {
            Ok(()) => self.outbox.mark_success(row.id).await,
            Err(err) => {
                warn!(
                    identifier = %row.identifier,
                    error = %err,
                    "alert publish failed"
                );
                let retries = self.outbox.record_publish_failure(row.id).await?;
                if retries > self.max_retries {
                    self.outbox.mark_failed(row.id).await?;
                }
                Ok(())
            }
        }
    }
}
