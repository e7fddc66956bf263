use chrono::Utc;
use rand::Rng;
use tracing::info;

use dari_domain::payload::ReportMessage;
use dari_domain::report::ReportKind;

use crate::domain::repository::{
    DisasterPublishLogRepository, MqReceiveLogRepository, ReportTransmitLogRepository,
};
use crate::domain::types::NewReportTransmit;
use crate::error::CentralError;

/// Suffix that turns an alert identifier into its result-report outbound id.
pub const RESULT_REPORT_SUFFIX: &str = "_RPT_1";

#[derive(Debug)]
pub struct ConsumeOutcome {
    pub inbox_id: i64,
    pub transmit_log_id: i64,
}

/// Failure of one delivery; carries the inbox row if it was written so the
/// dead-letter path can mark it.
#[derive(Debug)]
pub struct ConsumeFailure {
    pub inbox_id: Option<i64>,
    pub error: CentralError,
}

/// Consumes `report.external` deliveries into the transmit outbox.
pub struct ReportConsumeUseCase<
    M: MqReceiveLogRepository,
    R: ReportTransmitLogRepository,
    P: DisasterPublishLogRepository,
> {
    pub inbox: M,
    pub outbox: R,
    pub publishes: P,
    /// Our own id on the link; outbound ids are minted under it.
    pub dest_id: String,
}

impl<M, R, P> ReportConsumeUseCase<M, R, P>
where
    M: MqReceiveLogRepository,
    R: ReportTransmitLogRepository,
    P: DisasterPublishLogRepository,
{
    pub async fn execute(&self, payload: &str) -> Result<ConsumeOutcome, ConsumeFailure> {
        let inbox_id = self
            .inbox
            .insert_pending(payload)
            .await
            .map_err(|error| ConsumeFailure {
                inbox_id: None,
                error,
            })?;

        match self.stage(inbox_id, payload).await {
            Ok(transmit_log_id) => Ok(ConsumeOutcome {
                inbox_id,
                transmit_log_id,
            }),
            Err(error) => Err(ConsumeFailure {
                inbox_id: Some(inbox_id),
                error,
            }),
        }
    }

    async fn stage(&self, inbox_id: i64, payload: &str) -> Result<i64, CentralError> {
        let message: ReportMessage = serde_json::from_str(payload)
            .map_err(|err| CentralError::Parsing(format!("report payload: {err}")))?;

        let outbound_id = match message.kind {
            ReportKind::DeviceInfo | ReportKind::DeviceStatus => self.mint_outbound_id(),
            ReportKind::DisasterResult => {
                let identifier = result_identifier(&message.raw_message)?;
                // The referenced alert must have passed through this process;
                // a missing row is retried until the publish side catches up.
                if self
                    .publishes
                    .find_by_identifier(&identifier)
                    .await?
                    .is_none()
                {
                    return Err(CentralError::Validation(format!(
                        "no published alert for identifier {identifier}"
                    )));
                }
                format!("{identifier}{RESULT_REPORT_SUFFIX}")
            }
        };

        let transmit_log_id = self
            .outbox
            .stage_and_complete(
                inbox_id,
                &NewReportTransmit {
                    mq_receive_log_id: inbox_id,
                    kind: message.kind,
                    outbound_id: outbound_id.clone(),
                    external_system_name: message.external_system_name.clone(),
                    raw_message: message.raw_message,
                },
            )
            .await?;
        info!(
            outbound_id = %outbound_id,
            kind = %message.kind,
            system = %message.external_system_name,
            "report staged for transmit"
        );
        Ok(transmit_log_id)
    }

    /// `KR.<destId>_<epoch-ms><suffix>` — the random suffix keeps ids unique
    /// within one millisecond and across restarts.
    fn mint_outbound_id(&self) -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix: u16 = rand::thread_rng().gen();
        format!("KR.{}_{}{:04x}", self.dest_id, millis, suffix)
    }
}

/// Pull the alert identifier out of a disaster-result body.
fn result_identifier(raw_message: &str) -> Result<String, CentralError> {
    let value: serde_json::Value = serde_json::from_str(raw_message)
        .map_err(|err| CentralError::Parsing(format!("disaster-result body: {err}")))?;
    value
        .get("identifier")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| CentralError::Validation("disaster-result body missing identifier".into()))
}
