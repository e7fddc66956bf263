use dari_domain::report::ReportKind;
use dari_domain::status::DeliveryStatus;

/// New inbox row for a frame received on the upstream link.
#[derive(Debug, Clone)]
pub struct NewTcpReceiveLog {
    pub inbound_id: String,
    pub inbound_seq: i32,
    pub raw_message: String,
}

/// New outbox row staging an alert for publication onto the bus.
#[derive(Debug, Clone)]
pub struct NewDisasterPublish {
    pub tcp_receive_log_id: i64,
    pub routing_key: String,
    pub identifier: String,
    pub event_code: String,
    pub raw_message: String,
}

#[derive(Debug, Clone)]
pub struct DisasterPublishRow {
    pub id: i64,
    pub routing_key: String,
    pub identifier: String,
    pub event_code: String,
    pub raw_message: String,
    pub status: DeliveryStatus,
    pub retry_count: i32,
}

/// New outbox row for a subscriber report bound for the upstream system.
#[derive(Debug, Clone)]
pub struct NewReportTransmit {
    pub mq_receive_log_id: i64,
    pub kind: ReportKind,
    pub outbound_id: String,
    pub external_system_name: String,
    pub raw_message: String,
}

#[derive(Debug, Clone)]
pub struct ReportTransmitRow {
    pub id: i64,
    pub kind: ReportKind,
    pub outbound_id: String,
    pub external_system_name: String,
    pub raw_message: String,
    pub status: DeliveryStatus,
    pub retry_count: i32,
    pub report_sequence: i32,
    pub error_detail: Option<String>,
}

impl ReportTransmitRow {
    /// A row that has never been driven: first attempt goes out with the
    /// sequence it was inserted with.
    pub fn is_fresh(&self) -> bool {
        self.status == DeliveryStatus::Pending
            && self.retry_count == 0
            && self.error_detail.is_none()
    }
}
