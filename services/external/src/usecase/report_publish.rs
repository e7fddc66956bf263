use tracing::warn;

use dari_domain::payload::ReportMessage;

use crate::domain::repository::ReportPublishLogRepository;
use crate::domain::types::ReportPublishRow;
use crate::error::ExternalError;

/// Seam over the bus so the engine is testable without a broker.
#[allow(async_fn_in_trait)]
pub trait ReportBusPublisher: Send + Sync {
    async fn publish_report(
        &self,
        routing_key: &str,
        message: &ReportMessage,
    ) -> Result<(), anyhow::Error>;
}

/// Pushes staged reports onto the bus and settles their outbox rows.
pub struct ReportPublishEngine<R: ReportPublishLogRepository, P: ReportBusPublisher> {
    pub outbox: R,
    pub bus: P,
    pub max_retries: i32,
}

impl<R: ReportPublishLogRepository, P: ReportBusPublisher> ReportPublishEngine<R, P> {
    pub async fn drive(&self, row: ReportPublishRow) -> Result<(), ExternalError> {
        if row.status.is_terminal() {
            return Ok(());
        }

        let message = ReportMessage {
            kind: row.kind,
            external_system_name: row.external_system_name.clone(),
            raw_message: row.raw_message.clone(),
        };

        match self.bus.publish_report(&row.routing_key, &message).await {
            Ok(()) => self.outbox.mark_success(row.id).await,
            Err(err) => {
                warn!(id = row.id, error = %err, "report publish failed");
                let retries = self.outbox.record_publish_failure(row.id).await?;
                if retries > self.max_retries {
                    self.outbox.mark_failed(row.id).await?;
                }
                Ok(())
            }
        }
    }
}
