use async_trait::async_trait;
use lapin::options::ExchangeDeclareOptions;
use lapin::types::FieldTable;
use lapin::{Channel, ExchangeKind};
use tracing::error;

use dari_broker::{BusPublisher, ConsumeHandler, HandleError, TopologySpec};
use dari_domain::payload::DisasterMessage;

use crate::domain::repository::{
    DisasterPublishLogRepository, MqReceiveLogRepository, ReportTransmitLogRepository,
};
use crate::usecase::disaster_publish::AlertBusPublisher;
use crate::usecase::report_consume::{ConsumeFailure, ReportConsumeUseCase};

pub const DISASTER_EXCHANGE: &str = "disaster.topic";
pub const REPORT_EXCHANGE: &str = "report.direct";
pub const REPORT_ROUTING_KEY: &str = "report.external";

/// Queue topology for the `report.external` stream this side consumes.
pub fn report_topology(retry_ttl_ms: i32) -> TopologySpec {
    TopologySpec {
        main_exchange: REPORT_EXCHANGE.to_owned(),
        exchange_kind: ExchangeKind::Direct,
        main_queue: "report.external.queue".to_owned(),
        binding_key: REPORT_ROUTING_KEY.to_owned(),
        retry_exchange: "report_retry".to_owned(),
        wait_queue: "report.external.wait".to_owned(),
        dlx: "report_dlx".to_owned(),
        dlq: "report.external.dlq".to_owned(),
        dead_letter_key: REPORT_ROUTING_KEY.to_owned(),
        // Direct exchange: expiry must restate the key or it would be lost.
        retry_routing_key: Some(REPORT_ROUTING_KEY.to_owned()),
        retry_ttl_ms,
    }
}

/// The alert exchange this side publishes into. The consuming side owns the
/// queue topology; declaring the exchange here just makes startup order
/// irrelevant.
pub async fn declare_alert_exchange(channel: &Channel) -> Result<(), lapin::Error> {
    channel
        .exchange_declare(
            DISASTER_EXCHANGE,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
}

// ── publish side ─────────────────────────────────────────────────────────────

pub struct LapinAlertPublisher {
    pub publisher: BusPublisher,
}

impl AlertBusPublisher for LapinAlertPublisher {
    async fn publish_alert(
        &self,
        routing_key: &str,
        message: &DisasterMessage,
    ) -> Result<(), anyhow::Error> {
        let body = serde_json::to_vec(message)?;
        self.publisher
            .publish(DISASTER_EXCHANGE, routing_key, &body, None)
            .await?;
        Ok(())
    }
}

// ── consume side ─────────────────────────────────────────────────────────────

pub struct ReportConsumer<M, R, P>
where
    M: MqReceiveLogRepository,
    R: ReportTransmitLogRepository,
    P: DisasterPublishLogRepository,
{
    pub usecase: ReportConsumeUseCase<M, R, P>,
}

#[async_trait]
impl<M, R, P> ConsumeHandler for ReportConsumer<M, R, P>
where
    M: MqReceiveLogRepository,
    R: ReportTransmitLogRepository,
    P: DisasterPublishLogRepository,
{
    async fn handle(&self, payload: &[u8], _retry_count: u32) -> Result<(), HandleError> {
        let payload = String::from_utf8_lossy(payload).into_owned();
        match self.usecase.execute(&payload).await {
            Ok(_) => Ok(()),
            Err(ConsumeFailure { inbox_id, error }) => {
                Err(HandleError::new(inbox_id, error.into()))
            }
        }
    }

    async fn on_dead_letter(&self, inbox_id: Option<i64>, reason: &str) {
        let Some(inbox_id) = inbox_id else { return };
        if let Err(err) = self.usecase.inbox.mark_failed(inbox_id, reason).await {
            error!(inbox_id, error = %err, "failed to mark inbox row after dead-letter");
        }
    }
}
