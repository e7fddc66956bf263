use tracing::info;

use dari_domain::payload::DisasterMessage;

use crate::domain::repository::{
    DisasterTransmitLogRepository, ExternalSystemRepository, MqReceiveLogRepository,
};
use crate::domain::types::NewDisasterTransmit;
use crate::error::ExternalError;

#[derive(Debug)]
pub struct FanoutOutcome {
    pub inbox_id: i64,
    /// Rows actually created; duplicates collapsed by the per-subscriber
    /// unique key don't count.
    pub staged: u64,
}

#[derive(Debug)]
pub struct FanoutFailure {
    pub inbox_id: Option<i64>,
    pub error: ExternalError,
}

/// Consumes `disaster.*` deliveries into per-subscriber transmit rows.
pub struct DisasterFanoutUseCase<M, S, T>
where
    M: MqReceiveLogRepository,
    S: ExternalSystemRepository,
    T: DisasterTransmitLogRepository,
{
    pub inbox: M,
    pub systems: S,
    pub transmits: T,
}

impl<M, S, T> DisasterFanoutUseCase<M, S, T>
where
    M: MqReceiveLogRepository,
    S: ExternalSystemRepository,
    T: DisasterTransmitLogRepository,
{
    pub async fn execute(&self, payload: &str) -> Result<FanoutOutcome, FanoutFailure> {
        let inbox_id = self
            .inbox
            .insert_pending(payload)
            .await
            .map_err(|error| FanoutFailure {
                inbox_id: None,
                error,
            })?;

        match self.stage(inbox_id, payload).await {
            Ok(staged) => Ok(FanoutOutcome { inbox_id, staged }),
            Err(error) => Err(FanoutFailure {
                inbox_id: Some(inbox_id),
                error,
            }),
        }
    }

    async fn stage(&self, inbox_id: i64, payload: &str) -> Result<u64, ExternalError> {
        let message: DisasterMessage = serde_json::from_str(payload)
            .map_err(|err| ExternalError::Parsing(format!("disaster payload: {err}")))?;

        let targets: Vec<NewDisasterTransmit> = self
            .systems
            .list_active()
            .await?
            .into_iter()
            .filter(|system| system.subscribes_to(&message.event_code))
            .map(|system| NewDisasterTransmit {
                mq_receive_log_id: inbox_id,
                external_system_id: system.id,
                identifier: message.identifier.clone(),
                raw_message: message.raw_message.clone(),
            })
            .collect();

        let staged = self.transmits.stage_fanout(inbox_id, &targets).await?;
        info!(
            identifier = %message.identifier,
            event_code = %message.event_code,
            targets = targets.len(),
            staged,
            "alert fanned out"
        );
        Ok(staged)
    }
}
