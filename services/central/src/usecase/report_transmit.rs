use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::{Local, SecondsFormat};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use dari_domain::report::ReportKind;

use crate::domain::repository::{DisasterPublishLogRepository, ReportTransmitLogRepository};
use crate::domain::types::ReportTransmitRow;
use crate::error::CentralError;
use crate::protocol::cap::{build_report_alert, reference_string};
use crate::protocol::envelope::Envelope;
use crate::protocol::frame::encode_frame;
use crate::protocol::message::MessageId;
use crate::usecase::report_consume::RESULT_REPORT_SUFFIX;

/// Write access to the upstream link. Sends are fire-and-forget; the ack
/// arrives later as its own frame.
pub trait FrameSink: Send + Sync {
    fn is_active(&self) -> bool;

    /// Queue a frame for the link writer. Returns `false` (and does
    /// nothing) when the link is not active.
    fn send(&self, frame: Bytes) -> bool;
}

#[derive(Debug, Clone)]
pub struct TransmitSettings {
    pub max_retries: i32,
    pub ack_timeout: Duration,
    /// Sender id on outbound report CAPs.
    pub central_id: String,
    /// Addressee system id on outbound report CAPs.
    pub central_address: String,
    pub magic: u32,
}

/// Delivery engine for the report outbox.
///
/// One in-flight send per row: the row flips to SENT before the frame goes
/// out and the poll query skips fresh SENT rows, so the ack timer here is
/// the only thing that can put it back into play.
pub struct ReportTransmitEngine<R, P, S> {
    reports: R,
    publishes: P,
    sink: S,
    settings: TransmitSettings,
    ack_timers: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl<R, P, S> ReportTransmitEngine<R, P, S>
where
    R: ReportTransmitLogRepository + 'static,
    P: DisasterPublishLogRepository + 'static,
    S: FrameSink + 'static,
{
    pub fn new(reports: R, publishes: P, sink: S, settings: TransmitSettings) -> Self {
        Self {
            reports,
            publishes,
            sink,
            settings,
            ack_timers: Mutex::new(HashMap::new()),
        }
    }

    /// Drive one outbox row through a send attempt.
    pub async fn drive(self: Arc<Self>, row: ReportTransmitRow) -> Result<(), CentralError> {
        if !self.sink.is_active() {
            return Ok(());
        }

        // Re-driven rows get a fresh retry_count/report_sequence pair so
        // ack correlation stays unambiguous; the first attempt sends the
        // sequence the row was inserted with.
        let row = if row.is_fresh() {
            row
        } else {
            match self.reports.bump_attempt(row.id).await? {
                Some(row) => row,
                None => return Ok(()),
            }
        };

        if row.retry_count > self.settings.max_retries {
            self.reports.mark_failed(row.id, "retry limit exceeded").await?;
            return Ok(());
        }

        let references = match row.kind {
            ReportKind::DisasterResult => match self.resolve_references(&row).await? {
                Some(references) => Some(references),
                None => {
                    self.reports
                        .mark_failed(row.id, "referenced alert not found")
                        .await?;
                    return Ok(());
                }
            },
            _ => None,
        };

        let frame = self.build_frame(&row, references)?;
        if !self.sink.send(frame) {
            // Link dropped between the check and the send; the row stays
            // as it was and the next poll retries.
            return Ok(());
        }
        self.reports.mark_sent(row.id).await?;
        Self::arm_ack_timer(&self, row.id);
        Ok(())
    }

    /// Ack/nack correlation by `(outbound_id, report_sequence)`.
    pub async fn handle_ack(
        &self,
        outbound_id: &str,
        report_sequence: i32,
        result_code: &str,
    ) -> Result<(), CentralError> {
        let Some(row) = self
            .reports
            .find_by_attempt(outbound_id, report_sequence)
            .await?
        else {
            warn!(outbound_id, report_sequence, "ack for unknown attempt");
            return Ok(());
        };

        if let Some(timer) = self.ack_timers.lock().unwrap().remove(&row.id) {
            timer.abort();
        }

        if result_code == "200" {
            self.reports.mark_success(row.id).await?;
        } else {
            self.reports
                .mark_retry_pending(row.id, &format!("nack resultCode={result_code}"))
                .await?;
        }
        Ok(())
    }

    async fn handle_ack_timeout(&self, id: i64) {
        self.ack_timers.lock().unwrap().remove(&id);
        match self.reports.find(id).await {
            Ok(Some(row)) if !row.status.is_terminal() => {
                if let Err(err) = self.reports.mark_retry_pending(id, "ACK Timeout").await {
                    error!(id, error = %err, "failed to record ack timeout");
                }
            }
            Ok(_) => {}
            Err(err) => error!(id, error = %err, "ack-timeout row lookup failed"),
        }
    }

    fn arm_ack_timer(engine: &Arc<Self>, id: i64) {
        let timer_engine = Arc::clone(engine);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timer_engine.settings.ack_timeout).await;
            timer_engine.handle_ack_timeout(id).await;
        });
        if let Some(stale) = engine.ack_timers.lock().unwrap().insert(id, handle) {
            stale.abort();
        }
    }

    /// Recover the original alert's `(sender, identifier, sent)` for the
    /// `<references>` of a result report. `None` is terminal.
    async fn resolve_references(
        &self,
        row: &ReportTransmitRow,
    ) -> Result<Option<String>, CentralError> {
        let identifier = row
            .outbound_id
            .strip_suffix(RESULT_REPORT_SUFFIX)
            .unwrap_or(&row.outbound_id);

        let Some(publish) = self.publishes.find_by_identifier(identifier).await? else {
            return Ok(None);
        };
        let Ok(envelope) = Envelope::parse(&publish.raw_message) else {
            return Ok(None);
        };
        let Some(alert) = envelope.alert else {
            return Ok(None);
        };
        match (alert.sender, alert.identifier, alert.sent) {
            (Some(sender), Some(identifier), Some(sent)) => {
                Ok(Some(reference_string(&sender, &identifier, &sent)))
            }
            _ => Ok(None),
        }
    }

    fn build_frame(
        &self,
        row: &ReportTransmitRow,
        references: Option<String>,
    ) -> Result<Bytes, CentralError> {
        let sent = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        let alert = build_report_alert(
            row.kind,
            &row.outbound_id,
            &self.settings.central_id,
            &self.settings.central_address,
            &sent,
            &row.raw_message,
            references,
        );
        let envelope = Envelope {
            trans_msg_id: Some(row.outbound_id.clone()),
            trans_msg_seq: Some(row.report_sequence),
            alert: Some(alert),
            ..Default::default()
        };
        let body = envelope.to_xml()?;

        let message_id = match row.kind {
            ReportKind::DeviceInfo => MessageId::NfyDeviceInfo,
            ReportKind::DeviceStatus => MessageId::NfyDeviceSts,
            ReportKind::DisasterResult => MessageId::ReqDisReport,
        };
        Ok(encode_frame(message_id, self.settings.magic, body.as_bytes()))
    }
}
