use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use dari_domain::payload::ReportMessage;
use dari_domain::status::DeliveryStatus;
use dari_external::domain::repository::{
    DisasterTransmitLogRepository, ExternalSystemRepository, MqReceiveLogRepository,
    ReportIngressRepository, ReportPublishLogRepository,
};
use dari_external::domain::types::{
    DisasterTransmitRow, ExternalSystem, NewDisasterTransmit, NewReportPublish, ReportPublishRow,
    ReportWrites,
};
use dari_external::error::ExternalError;
use dari_external::usecase::report_publish::ReportBusPublisher;
use dari_external::ws::{AlertEmitter, DisasterEvent, EmitOutcome};

// ── fixtures ─────────────────────────────────────────────────────────────────

pub fn test_system(name: &str, codes: &[&str]) -> ExternalSystem {
    ExternalSystem {
        id: Uuid::new_v4(),
        system_name: name.to_owned(),
        api_key: format!("key-{name}"),
        origin_urls: vec!["https://example.com".to_owned()],
        subscribed_event_codes: codes.iter().map(|c| (*c).to_owned()).collect(),
        is_active: true,
    }
}

pub fn transmit_row(id: i64, system: Uuid, identifier: &str) -> DisasterTransmitRow {
    DisasterTransmitRow {
        id,
        external_system_id: system,
        identifier: identifier.to_owned(),
        raw_message: "<data/>".to_owned(),
        status: DeliveryStatus::Pending,
        retry_count: 0,
    }
}

// ── MockSystems ──────────────────────────────────────────────────────────────

pub struct MockSystems {
    pub systems: Vec<ExternalSystem>,
}

impl MockSystems {
    pub fn new(systems: Vec<ExternalSystem>) -> Self {
        Self { systems }
    }
}

impl ExternalSystemRepository for MockSystems {
    async fn find_active_by_auth(
        &self,
        system_name: &str,
        api_key: &str,
    ) -> Result<Option<ExternalSystem>, ExternalError> {
        Ok(self
            .systems
            .iter()
            .find(|s| s.system_name == system_name && s.api_key == api_key && s.is_active)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<ExternalSystem>, ExternalError> {
        Ok(self.systems.iter().filter(|s| s.is_active).cloned().collect())
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
}

impl MockMqInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows_handle(&self) -> Arc<Mutex<Vec<StoredMqLog>>> {
        Arc::clone(&self.rows)
    }
}

impl MqReceiveLogRepository for MockMqInbox {
    async fn insert_pending(&self, _raw_message: &str) -> Result<i64, ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(StoredMqLog {
            id,
            status: DeliveryStatus::Pending,
            error_message: None,
        });
        Ok(id)
    }

    async fn mark_failed(&self, id: i64, message: &str) -> Result<(), ExternalError> {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
            row.status = DeliveryStatus::Failed;
            row.error_message = Some(message.to_owned());
        }
        Ok(())
    }
}

// ── MockTransmits ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransmits {
    pub rows: Arc<Mutex<Vec<DisasterTransmitRow>>>,
    pub completed_inboxes: Arc<Mutex<Vec<i64>>>,
    pub inbox_rows: Arc<Mutex<Vec<StoredMqLog>>>,
}

impl MockTransmits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<DisasterTransmitRow>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            ..Default::default()
        }
    }

    pub fn sharing_inbox(inbox_rows: Arc<Mutex<Vec<StoredMqLog>>>) -> Self {
        Self {
            inbox_rows,
            ..Default::default()
        }
    }

    pub fn rows_handle(&self) -> Arc<Mutex<Vec<DisasterTransmitRow>>> {
        Arc::clone(&self.rows)
    }
}

impl DisasterTransmitLogRepository for MockTransmits {
    async fn stage_fanout(
        &self,
        inbox_id: i64,
        new_rows: &[NewDisasterTransmit],
    ) -> Result<u64, ExternalError> {
        let mut staged = 0;
        {
            let mut rows = self.rows.lock().unwrap();
            for new_row in new_rows {
                let duplicate = rows.iter().any(|r| {
                    r.external_system_id == new_row.external_system_id
                        && r.identifier == new_row.identifier
                });
                if duplicate {
                    continue;
                }
                let id = rows.len() as i64 + 1;
                rows.push(DisasterTransmitRow {
                    id,
                    external_system_id: new_row.external_system_id,
                    identifier: new_row.identifier.clone(),
                    raw_message: new_row.raw_message.clone(),
                    status: DeliveryStatus::Pending,
                    retry_count: 0,
                });
                staged += 1;
            }
        }
        self.completed_inboxes.lock().unwrap().push(inbox_id);
        if let Some(row) = self
            .inbox_rows
            .lock()
            .unwrap()
            .iter_mut()
            .find(|r| r.id == inbox_id)
        {
            row.status = DeliveryStatus::Success;
        }
        Ok(staged)
    }

    async fn fetch_due(
        &self,
        limit: u64,
        _stale_after: Duration,
    ) -> Result<Vec<DisasterTransmitRow>, ExternalError> {
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

    async fn find(&self, id: i64) -> Result<Option<DisasterTransmitRow>, ExternalError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn exists_by_identifier(
        &self,
        external_system_id: Uuid,
        identifier: &str,
    ) -> Result<bool, ExternalError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.external_system_id == external_system_id && r.identifier == identifier))
    }

    async fn mark_sent(&self, id: i64) -> Result<(), ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            row.status = DeliveryStatus::Sent;
        }
        Ok(())
    }

    async fn mark_success(&self, id: i64) -> Result<bool, ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            Some(row) => {
                row.status = DeliveryStatus::Success;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_retry_pending(&self, id: i64) -> Result<bool, ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            Some(row) => {
                row.status = DeliveryStatus::Pending;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn bump_retry(&self, id: i64) -> Result<Option<i32>, ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            Some(row) => {
                row.retry_count += 1;
                Ok(Some(row.retry_count))
            }
            None => Ok(None),
        }
    }

    async fn mark_failed(&self, id: i64) -> Result<(), ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            row.status = DeliveryStatus::Failed;
        }
        Ok(())
    }
}

// ── MockEmitter ──────────────────────────────────────────────────────────────

/// Scripted emitter: pops the next outcome per emit and records the events
/// it was asked to deliver.
pub struct MockEmitter {
    pub connected: Mutex<HashSet<Uuid>>,
    pub outcomes: Mutex<Vec<EmitOutcome>>,
    pub emitted: Arc<Mutex<Vec<(Uuid, DisasterEvent)>>>,
}

impl MockEmitter {
    pub fn new(connected: &[Uuid], outcomes: Vec<EmitOutcome>) -> Self {
        Self {
            connected: Mutex::new(connected.iter().copied().collect()),
            outcomes: Mutex::new(outcomes),
            emitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn emitted_handle(&self) -> Arc<Mutex<Vec<(Uuid, DisasterEvent)>>> {
        Arc::clone(&self.emitted)
    }
}

impl AlertEmitter for MockEmitter {
    async fn emit(
        &self,
        subscriber_id: Uuid,
        event: DisasterEvent,
        _ack_timeout: Duration,
    ) -> EmitOutcome {
        self.emitted.lock().unwrap().push((subscriber_id, event));
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            EmitOutcome::Timeout
        } else {
            outcomes.remove(0)
        }
    }

    fn is_connected(&self, subscriber_id: Uuid) -> bool {
        self.connected.lock().unwrap().contains(&subscriber_id)
    }
}

// ── MockIngressRepo ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedIngress {
    pub system_name: String,
    pub request_path: String,
    pub raw_body: String,
    pub writes: ReportWrites,
    pub publish: NewReportPublish,
}

#[derive(Default)]
pub struct MockIngressRepo {
    pub records: Arc<Mutex<Vec<RecordedIngress>>>,
}

impl MockIngressRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_handle(&self) -> Arc<Mutex<Vec<RecordedIngress>>> {
        Arc::clone(&self.records)
    }
}

impl ReportIngressRepository for MockIngressRepo {
    async fn record(
        &self,
        system: &ExternalSystem,
        request_path: &str,
        raw_body: &str,
        writes: &ReportWrites,
        publish: &NewReportPublish,
    ) -> Result<i64, ExternalError> {
        let mut records = self.records.lock().unwrap();
        records.push(RecordedIngress {
            system_name: system.system_name.clone(),
            request_path: request_path.to_owned(),
            raw_body: raw_body.to_owned(),
            writes: writes.clone(),
            publish: publish.clone(),
        });
        Ok(records.len() as i64)
    }
}

// ── MockReportOutbox / MockBus ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockReportOutbox {
    pub rows: Arc<Mutex<Vec<ReportPublishRow>>>,
}

impl MockReportOutbox {
    pub fn with_rows(rows: Vec<ReportPublishRow>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    pub fn rows_handle(&self) -> Arc<Mutex<Vec<ReportPublishRow>>> {
        Arc::clone(&self.rows)
    }
}

impl ReportPublishLogRepository for MockReportOutbox {
    async fn fetch_pending(&self, limit: u64) -> Result<Vec<ReportPublishRow>, ExternalError> {
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

    async fn mark_success(&self, id: i64) -> Result<(), ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            row.status = DeliveryStatus::Success;
        }
        Ok(())
    }

    async fn record_publish_failure(&self, id: i64) -> Result<i32, ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|r| r.id == id).expect("row exists");
        row.retry_count += 1;
        Ok(row.retry_count)
    }

    async fn mark_failed(&self, id: i64) -> Result<(), ExternalError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id && !r.status.is_terminal()) {
            row.status = DeliveryStatus::Failed;
        }
        Ok(())
    }
}

/// Scripted bus: fails the first `failures` publishes, then succeeds,
/// recording everything.
pub struct MockBus {
    pub failures: Mutex<u32>,
    pub published: Arc<Mutex<Vec<(String, ReportMessage)>>>,
}

impl MockBus {
    pub fn reliable() -> Self {
        Self::failing(0)
    }

    pub fn failing(failures: u32) -> Self {
        Self {
            failures: Mutex::new(failures),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn published_handle(&self) -> Arc<Mutex<Vec<(String, ReportMessage)>>> {
        Arc::clone(&self.published)
    }
}

impl ReportBusPublisher for MockBus {
    async fn publish_report(
        &self,
        routing_key: &str,
        message: &ReportMessage,
    ) -> Result<(), anyhow::Error> {
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                anyhow::bail!("broker unavailable");
            }
        }
        self.published
            .lock()
            .unwrap()
            .push((routing_key.to_owned(), message.clone()));
        Ok(())
    }
}
