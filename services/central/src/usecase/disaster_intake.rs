use chrono::{Local, SecondsFormat};
use tracing::{info, warn};

use crate::domain::repository::{DisasterPublishLogRepository, TcpReceiveLogRepository};
use crate::domain::types::{NewDisasterPublish, NewTcpReceiveLog};
use crate::error::{ACK_OK, CentralError, nack_codes};
use crate::protocol::cap::{CapAlert, build_ack_alert};
use crate::protocol::envelope::Envelope;
use crate::protocol::event_codes::is_valid_event_code;

/// Inbound disaster-notification pipeline.
///
/// Runs the ordered steps — parse, dedup, inbox insert, CAP validation,
/// allowlist, idempotent outbox staging — and always produces the ack/nack
/// envelope to send back, whatever happened.
pub struct DisasterIntakeUseCase<I: TcpReceiveLogRepository, O: DisasterPublishLogRepository> {
    pub inbox: I,
    pub outbox: O,
    /// Our own id on the link; the sender of every ack.
    pub dest_id: String,
}

impl<I: TcpReceiveLogRepository, O: DisasterPublishLogRepository> DisasterIntakeUseCase<I, O> {
    pub async fn execute(&self, body: &str) -> Envelope {
        let envelope = match Envelope::parse(body) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "disaster notification body did not parse");
                return self.reply(None, None, None, Err(err.into()));
            }
        };

        let trans_msg_id = envelope.trans_msg_id.clone();
        let trans_msg_seq = envelope.trans_msg_seq;
        let alert = envelope.alert.clone();

        let result = self.process(body, &envelope).await;
        match &result {
            Ok(()) => info!(
                trans_msg_id = trans_msg_id.as_deref().unwrap_or(""),
                "disaster notification accepted"
            ),
            Err(err) => warn!(
                trans_msg_id = trans_msg_id.as_deref().unwrap_or(""),
                error = %err,
                "disaster notification rejected"
            ),
        }
        self.reply(trans_msg_id, trans_msg_seq, alert.as_ref(), result)
    }

    async fn process(&self, body: &str, envelope: &Envelope) -> Result<(), CentralError> {
        let trans_msg_id = envelope
            .trans_msg_id
            .as_deref()
            .ok_or_else(|| CentralError::Parsing("missing transMsgId".to_owned()))?;
        let trans_msg_seq = envelope
            .trans_msg_seq
            .ok_or_else(|| CentralError::Parsing("missing transMsgSeq".to_owned()))?;
        let alert = envelope
            .alert
            .as_ref()
            .ok_or_else(|| CentralError::Parsing("missing capInfo alert".to_owned()))?;

        if self.inbox.exists(trans_msg_id, trans_msg_seq).await? {
            return Err(CentralError::Duplicate);
        }

        let inbox_id = self
            .inbox
            .insert_pending(&NewTcpReceiveLog {
                inbound_id: trans_msg_id.to_owned(),
                inbound_seq: trans_msg_seq,
                raw_message: body.to_owned(),
            })
            .await?;

        let staged = self.validate_and_stage(inbox_id, alert, body).await;
        if let Err(err) = &staged {
            // The staging transaction rolled back; record the failure on its
            // own connection, best-effort.
            if let Err(mark_err) = self.inbox.mark_failed(inbox_id, &err.to_string()).await {
                warn!(inbox_id, error = %mark_err, "failed to mark inbox row FAILED");
            }
        }
        staged
    }

    async fn validate_and_stage(
        &self,
        inbox_id: i64,
        alert: &CapAlert,
        body: &str,
    ) -> Result<(), CentralError> {
        let identifier = require(alert.identifier.as_deref(), "alert.identifier")?;
        require(alert.sender.as_deref(), "alert.sender")?;
        require(alert.sent.as_deref(), "alert.sent")?;
        let event_code = require(alert.event_code(), "alert.info.eventCode.value")?;

        if !is_valid_event_code(event_code) {
            return Err(CentralError::Profile(format!(
                "unknown event code {event_code}"
            )));
        }

        let staged = self
            .outbox
            .stage_and_complete(
                inbox_id,
                &NewDisasterPublish {
                    tcp_receive_log_id: inbox_id,
                    routing_key: format!("disaster.{event_code}"),
                    identifier: identifier.to_owned(),
                    event_code: event_code.to_owned(),
                    raw_message: body.to_owned(),
                },
            )
            .await?;
        if !staged {
            // Same alert identifier arrived under a different frame id;
            // the unique key collapsed it.
            info!(identifier, "alert already staged; collapsed");
        }
        Ok(())
    }

    fn reply(
        &self,
        trans_msg_id: Option<String>,
        trans_msg_seq: Option<i32>,
        alert: Option<&CapAlert>,
        result: Result<(), CentralError>,
    ) -> Envelope {
        let (result_code, note_code, note_message) = match &result {
            Ok(()) => ACK_OK,
            Err(err) => nack_codes(err),
        };
        let sent = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        Envelope {
            result_code: Some(result_code.to_owned()),
            result: Some(note_message.to_owned()),
            trans_msg_id,
            trans_msg_seq,
            alert: Some(build_ack_alert(
                alert,
                &self.dest_id,
                &sent,
                note_code,
                note_message,
            )),
            ..Default::default()
        }
    }
}

fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, CentralError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CentralError::Validation(format!("missing {field}"))),
    }
}
