use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use dari_central::domain::repository::{
    DisasterPublishLogRepository, MqReceiveLogRepository, ReportTransmitLogRepository,
    TcpReceiveLogRepository,
};
use dari_central::domain::types::{
    DisasterPublishRow, NewDisasterPublish, NewReportTransmit, NewTcpReceiveLog, ReportTransmitRow,
};
use dari_central::error::CentralError;
use dari_central::usecase::report_transmit::FrameSink;
use dari_domain::status::DeliveryStatus;

pub const TEST_MAGIC: u32 = 0x4b52_4554;

// ── MockTcpInbox ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoredTcpLog {
    pub id: i64,
    pub inbound_id: String,
    pub inbound_seq: i32,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
}

#[derive(Default)]
pub struct MockTcpInbox {
    pub rows: Arc<Mutex<Vec<StoredTcpLog>>>,
}

impl MockTcpInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows_handle(&self) -> Arc<Mutex<Vec<StoredTcpLog>>> {
        Arc::clone(&self.rows)
    }
}

impl TcpReceiveLogRepository for MockTcpInbox {
    async fn exists(&self, inbound_id: &str, inbound_seq: i32) -> Result<bool, CentralError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.inbound_id == inbound_id && r.inbound_seq == inbound_seq))
    }

    async fn insert_pending(&self, log: &NewTcpReceiveLog) -> Result<i64, CentralError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(StoredTcpLog {
            id,
            inbound_id: log.inbound_id.clone(),
            inbound_seq: log.inbound_seq,
            status: DeliveryStatus::Pending,
            error_message: None,
        });
        Ok(id)
    }

    async fn mark_failed(&self, id: i64, message: &str) -> Result<(), CentralError> {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
            row.status = DeliveryStatus::Failed;
            row.error_message = Some(message.to_owned());
        }
        Ok(())
    }
}

// ── MockPublishOutbox ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPublishOutbox {
    pub rows: Arc<Mutex<Vec<DisasterPublishRow>>>,
    pub completed_inboxes: Arc<Mutex<Vec<i64>>>,
    /// Inbox rows flipped to SUCCESS by `stage_and_complete`, mirrored into
    /// the tcp mock when both share it.
    pub tcp_rows: Arc<Mutex<Vec<StoredTcpLog>>>,
}

impl MockPublishOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sharing_inbox(tcp_rows: Arc<Mutex<Vec<StoredTcpLog>>>) -> Self {
        Self {
            tcp_rows,
            ..Default::default()
        }
    }

    pub fn with_rows(rows: Vec<DisasterPublishRow>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            ..Default::default()
        }
    }

    pub fn rows_handle(&self) -> Arc<Mutex<Vec<DisasterPublishRow>>> {
        Arc::clone(&self.rows)
    }
}

impl DisasterPublishLogRepository for MockPublishOutbox {
    async fn stage_and_complete(
        &self,
        inbox_id: i64,
        publish: &NewDisasterPublish,
    ) -> Result<bool, CentralError> {
        let staged = {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|r| r.identifier == publish.identifier) {
                false
            } else {
                let id = rows.len() as i64 + 1;
                rows.push(DisasterPublishRow {
                    id,
                    routing_key: publish.routing_key.clone(),
                    identifier: publish.identifier.clone(),
                    event_code: publish.event_code.clone(),
                    raw_message: publish.raw_message.clone(),
                    status: DeliveryStatus::Pending,
                    retry_count: 0,
                });
                true
            }
        };
        self.completed_inboxes.lock().unwrap().push(inbox_id);
        if let Some(row) = self
            .tcp_rows
            .lock()
            .unwrap()
            .iter_mut()
            .find(|r| r.id == inbox_id)
        {
            row.status = DeliveryStatus::Success;
        }
        Ok(staged)
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<DisasterPublishRow>, CentralError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.identifier == identifier)
            .cloned())
    }

    async fn fetch_pending(&self, limit: u64) -> Result<Vec<DisasterPublishRow>, CentralError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == DeliveryStatus::Pending)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_success(&self, id: i64) -> Result<(), CentralError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            row.status = DeliveryStatus::Success;
        }
        Ok(())
    }

    async fn record_publish_failure(&self, id: i64) -> Result<i32, CentralError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|r| r.id == id).expect("row exists");
        row.retry_count += 1;
        Ok(row.retry_count)
    }

    async fn mark_failed(&self, id: i64) -> Result<(), CentralError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            row.status = DeliveryStatus::Failed;
        }
        Ok(())
    }
}

// ── MockMqInbox ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoredMqLog {
    pub id: i64,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
}

#[derive(Default)]
pub struct MockMqInbox {
    pub rows: Arc<Mutex<Vec<StoredMqLog>>>,
    pub fail_insert: bool,
}

impl MockMqInbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MqReceiveLogRepository for MockMqInbox {
    async fn insert_pending(&self, _raw_message: &str) -> Result<i64, CentralError> {
        if self.fail_insert {
            return Err(CentralError::Storage(anyhow::anyhow!("insert refused")));
        }
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(StoredMqLog {
            id,
            status: DeliveryStatus::Pending,
            error_message: None,
        });
        Ok(id)
    }

    async fn mark_failed(&self, id: i64, message: &str) -> Result<(), CentralError> {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
            row.status = DeliveryStatus::Failed;
            row.error_message = Some(message.to_owned());
        }
        Ok(())
    }
}

// ── MockReportOutbox ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockReportOutbox {
    pub rows: Arc<Mutex<Vec<ReportTransmitRow>>>,
    pub completed_inboxes: Arc<Mutex<Vec<i64>>>,
}

impl MockReportOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<ReportTransmitRow>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            ..Default::default()
        }
    }

    pub fn rows_handle(&self) -> Arc<Mutex<Vec<ReportTransmitRow>>> {
        Arc::clone(&self.rows)
    }
}

impl ReportTransmitLogRepository for MockReportOutbox {
    async fn stage_and_complete(
        &self,
        inbox_id: i64,
        report: &NewReportTransmit,
    ) -> Result<i64, CentralError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(ReportTransmitRow {
            id,
            kind: report.kind,
            outbound_id: report.outbound_id.clone(),
            external_system_name: report.external_system_name.clone(),
            raw_message: report.raw_message.clone(),
            status: DeliveryStatus::Pending,
            retry_count: 0,
            report_sequence: 1,
            error_detail: None,
        });
        self.completed_inboxes.lock().unwrap().push(inbox_id);
        Ok(id)
    }

    async fn fetch_due(
        &self,
        limit: u64,
        _stale_after: Duration,
    ) -> Result<Vec<ReportTransmitRow>, CentralError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == DeliveryStatus::Pending)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<ReportTransmitRow>, CentralError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_attempt(
        &self,
        outbound_id: &str,
        report_sequence: i32,
    ) -> Result<Option<ReportTransmitRow>, CentralError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.outbound_id == outbound_id && r.report_sequence == report_sequence)
            .cloned())
    }

    async fn bump_attempt(&self, id: i64) -> Result<Option<ReportTransmitRow>, CentralError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            Some(row) => {
                row.retry_count += 1;
                row.report_sequence += 1;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn mark_sent(&self, id: i64) -> Result<(), CentralError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            row.status = DeliveryStatus::Sent;
        }
        Ok(())
    }

    async fn mark_success(&self, id: i64) -> Result<bool, CentralError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            Some(row) => {
                row.status = DeliveryStatus::Success;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_retry_pending(&self, id: i64, reason: &str) -> Result<bool, CentralError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            Some(row) => {
                row.status = DeliveryStatus::Pending;
                row.error_detail = Some(reason.to_owned());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_failed(&self, id: i64, reason: &str) -> Result<(), CentralError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            row.status = DeliveryStatus::Failed;
            row.error_detail = Some(reason.to_owned());
        }
        Ok(())
    }
}

// ── MockFrameSink ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockFrameSink {
    pub active: AtomicBool,
    pub frames: Arc<Mutex<Vec<Bytes>>>,
}

impl MockFrameSink {
    pub fn active() -> Self {
        let sink = Self::default();
        sink.active.store(true, Ordering::Relaxed);
        sink
    }

    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn frames_handle(&self) -> Arc<Mutex<Vec<Bytes>>> {
        Arc::clone(&self.frames)
    }
}

impl FrameSink for MockFrameSink {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn send(&self, frame: Bytes) -> bool {
        if !self.is_active() {
            return false;
        }
        self.frames.lock().unwrap().push(frame);
        true
    }
}

// ── fixtures ─────────────────────────────────────────────────────────────────

use dari_central::protocol::cap::{CapAlert, CapInfo, CapNamedValue};
use dari_central::protocol::envelope::Envelope;

pub fn sample_alert(identifier: &str, event_code: &str) -> CapAlert {
    CapAlert {
        identifier: Some(identifier.to_owned()),
        sender: Some("cas.go.kr".to_owned()),
        sent: Some("2024-07-01T09:00:00+09:00".to_owned()),
        status: Some("Actual".to_owned()),
        msg_type: Some("Alert".to_owned()),
        scope: Some("Private".to_owned()),
        info: Some(CapInfo {
            language: Some("ko-KR".to_owned()),
            category: Some("Met".to_owned()),
            event: Some("폭염경보".to_owned()),
            urgency: Some("Immediate".to_owned()),
            severity: Some("Severe".to_owned()),
            certainty: Some("Observed".to_owned()),
            event_code: Some(CapNamedValue {
                value_name: "EVENT_CODE".to_owned(),
                value: event_code.to_owned(),
            }),
            parameters: vec![],
        }),
        ..Default::default()
    }
}

/// A complete `NFY_DIS_INFO` body.
pub fn notify_body(trans_msg_id: &str, trans_msg_seq: i32, identifier: &str, event_code: &str) -> String {
    Envelope {
        trans_msg_id: Some(trans_msg_id.to_owned()),
        trans_msg_seq: Some(trans_msg_seq),
        alert: Some(sample_alert(identifier, event_code)),
        ..Default::default()
    }
    .to_xml()
    .expect("fixture builds")
}
