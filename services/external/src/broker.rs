use async_trait::async_trait;
use lapin::options::ExchangeDeclareOptions;
use lapin::types::FieldTable;
use lapin::{Channel, ExchangeKind};
use tracing::error;

use dari_broker::{BusPublisher, ConsumeHandler, HandleError, TopologySpec};
use dari_domain::payload::ReportMessage;

use crate::domain::repository::{
    DisasterTransmitLogRepository, ExternalSystemRepository, MqReceiveLogRepository,
};
use crate::usecase::disaster_fanout::{DisasterFanoutUseCase, FanoutFailure};
use crate::usecase::report_publish::ReportBusPublisher;

pub const DISASTER_EXCHANGE: &str = "disaster.topic";
pub const REPORT_EXCHANGE: &str = "report.direct";

/// Queue topology for the `disaster.*` stream this side consumes.
pub fn disaster_topology(retry_ttl_ms: i32) -> TopologySpec {
    TopologySpec {
        main_exchange: DISASTER_EXCHANGE.to_owned(),
        exchange_kind: ExchangeKind::Topic,
        main_queue: "disaster.alerts.queue".to_owned(),
        binding_key: "disaster.#".to_owned(),
        retry_exchange: "disaster_retry".to_owned(),
        wait_queue: "disaster.alerts.wait".to_owned(),
        dlx: "disaster_dlx".to_owned(),
        dlq: "disaster.alerts.dlq".to_owned(),
        dead_letter_key: "#".to_owned(),
        // Topic exchange: expiry keeps the original `disaster.<code>` key.
        retry_routing_key: None,
        retry_ttl_ms,
    }
}

/// The report exchange this side publishes into.
pub async fn declare_report_exchange(channel: &Channel) -> Result<(), lapin::Error> {
    channel
        .exchange_declare(
            REPORT_EXCHANGE,
            ExchangeKind::Direct,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
}

// ── publish side ─────────────────────────────────────────────────────────────

pub struct LapinReportPublisher {
    pub publisher: BusPublisher,
}

impl ReportBusPublisher for LapinReportPublisher {
    async fn publish_report(
        &self,
        routing_key: &str,
        message: &ReportMessage,
    ) -> Result<(), anyhow::Error> {
        let body = serde_json::to_vec(message)?;
        self.publisher
            .publish(REPORT_EXCHANGE, routing_key, &body, None)
            .await?;
        Ok(())
    }
}

// ── consume side ─────────────────────────────────────────────────────────────

pub struct DisasterConsumer<M, S, T>
where
    M: MqReceiveLogRepository,
    S: ExternalSystemRepository,
    T: DisasterTransmitLogRepository,
{
    pub usecase: DisasterFanoutUseCase<M, S, T>,
}

#[async_trait]
impl<M, S, T> ConsumeHandler for DisasterConsumer<M, S, T>
where
    M: MqReceiveLogRepository,
    S: ExternalSystemRepository,
    T: DisasterTransmitLogRepository,
{
    async fn handle(&self, payload: &[u8], _retry_count: u32) -> Result<(), HandleError> {
        let payload = String::from_utf8_lossy(payload).into_owned();
        match self.usecase.execute(&payload).await {
            Ok(_) => Ok(()),
            Err(FanoutFailure { inbox_id, error }) => Err(HandleError::new(inbox_id, error.into())),
        }
    }

    async fn on_dead_letter(&self, inbox_id: Option<i64>, reason: &str) {
        let Some(inbox_id) = inbox_id else { return };
        if let Err(err) = self.usecase.inbox.mark_failed(inbox_id, reason).await {
            error!(inbox_id, error = %err, "failed to mark inbox row after dead-letter");
        }
    }
}
