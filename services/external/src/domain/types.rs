use uuid::Uuid;

use dari_domain::report::ReportKind;
use dari_domain::status::DeliveryStatus;

/// Subscriber system as the rest of the service sees it.
#[derive(Debug, Clone)]
pub struct ExternalSystem {
    pub id: Uuid,
    pub system_name: String,
    pub api_key: String,
    pub origin_urls: Vec<String>,
    pub subscribed_event_codes: Vec<String>,
    pub is_active: bool,
}

impl ExternalSystem {
    pub fn subscribes_to(&self, event_code: &str) -> bool {
        self.subscribed_event_codes.iter().any(|c| c == event_code)
    }
}

/// Device fields as reported over the ingress; upserted on
/// `(external_system_id, device_id)`.
#[derive(Debug, Clone)]
pub struct DeviceUpsert {
    pub device_id: String,
    pub kind: String,
    pub name: String,
    pub server_ip: Option<String>,
    pub server_name: Option<String>,
    pub model: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeviceStatusEntry {
    pub device_id: String,
    pub status: String,
    pub note: Option<String>,
}

/// Domain rows written alongside an ingress call, inside its transaction.
#[derive(Debug, Clone)]
pub enum ReportWrites {
    Devices(Vec<DeviceUpsert>),
    DeviceStatuses(Vec<DeviceStatusEntry>),
    None,
}

/// New outbox row staging a report for the bus. The audit-log id is filled
/// in by the repository inside the same transaction.
#[derive(Debug, Clone)]
pub struct NewReportPublish {
    pub kind: ReportKind,
    pub external_system_name: String,
    pub routing_key: String,
    pub raw_message: String,
}

#[derive(Debug, Clone)]
pub struct ReportPublishRow {
    pub id: i64,
    pub kind: ReportKind,
    pub external_system_name: String,
    pub routing_key: String,
    pub raw_message: String,
    pub status: DeliveryStatus,
    pub retry_count: i32,
}

/// New per-subscriber delivery row for one consumed alert.
#[derive(Debug, Clone)]
pub struct NewDisasterTransmit {
    pub mq_receive_log_id: i64,
    pub external_system_id: Uuid,
    pub identifier: String,
    pub raw_message: String,
}

#[derive(Debug, Clone)]
pub struct DisasterTransmitRow {
    pub id: i64,
    pub external_system_id: Uuid,
    pub identifier: String,
    pub raw_message: String,
    pub status: DeliveryStatus,
    pub retry_count: i32,
}
