#![allow(async_fn_in_trait)]

use std::time::Duration;

use crate::domain::types::{
    DisasterPublishRow, NewDisasterPublish, NewReportTransmit, NewTcpReceiveLog, ReportTransmitRow,
};
use crate::error::CentralError;

/// Inbox of frames received on the upstream link.
pub trait TcpReceiveLogRepository: Send + Sync {
    async fn exists(&self, inbound_id: &str, inbound_seq: i32) -> Result<bool, CentralError>;

    async fn insert_pending(&self, log: &NewTcpReceiveLog) -> Result<i64, CentralError>;

    /// Best-effort failure marker, run outside the aborted transaction.
    async fn mark_failed(&self, id: i64, message: &str) -> Result<(), CentralError>;
}

/// Outbox of alerts staged for the bus.
pub trait DisasterPublishLogRepository: Send + Sync {
    /// Stage the alert and flip the inbox row to SUCCESS, atomically.
    /// Returns `false` when the identifier was already staged — the
    /// idempotent replay path.
    async fn stage_and_complete(
        &self,
        inbox_id: i64,
        publish: &NewDisasterPublish,
    ) -> Result<bool, CentralError>;

    fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> impl std::future::Future<Output = Result<Option<DisasterPublishRow>, CentralError>> + Send;

    /// Pending rows in insertion order, bounded.
    async fn fetch_pending(&self, limit: u64) -> Result<Vec<DisasterPublishRow>, CentralError>;

    async fn mark_success(&self, id: i64) -> Result<(), CentralError>;

    /// Bump the retry counter after a failed publish; returns the new count.
    async fn record_publish_failure(&self, id: i64) -> Result<i32, CentralError>;

    async fn mark_failed(&self, id: i64) -> Result<(), CentralError>;
}

/// Inbox of bus deliveries.
pub trait MqReceiveLogRepository: Send + Sync {
    fn insert_pending(
        &self,
        raw_message: &str,
    ) -> impl std::future::Future<Output = Result<i64, CentralError>> + Send;

    fn mark_failed(
        &self,
        id: i64,
        message: &str,
    ) -> impl std::future::Future<Output = Result<(), CentralError>> + Send;
}

/// Outbox of reports bound for the upstream system.
pub trait ReportTransmitLogRepository: Send + Sync {
    /// Insert the outbox row and flip the inbox row to SUCCESS, atomically.
    fn stage_and_complete(
        &self,
        inbox_id: i64,
        report: &NewReportTransmit,
    ) -> impl std::future::Future<Output = Result<i64, CentralError>> + Send;

    /// Rows due for a drive: PENDING, or SENT whose last transition is
    /// older than `stale_after` (ack timer lost).
    async fn fetch_due(
        &self,
        limit: u64,
        stale_after: Duration,
    ) -> Result<Vec<ReportTransmitRow>, CentralError>;

    fn find(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<ReportTransmitRow>, CentralError>> + Send;

    async fn find_by_attempt(
        &self,
        outbound_id: &str,
        report_sequence: i32,
    ) -> Result<Option<ReportTransmitRow>, CentralError>;

    /// Increment `retry_count` and `report_sequence` together before a
    /// re-drive; returns the updated row.
    async fn bump_attempt(&self, id: i64) -> Result<Option<ReportTransmitRow>, CentralError>;

    async fn mark_sent(&self, id: i64) -> Result<(), CentralError>;

    /// Guarded transition: no-op (returns `false`) when the row is already
    /// terminal.
    async fn mark_success(&self, id: i64) -> Result<bool, CentralError>;

    /// Back to PENDING with a failure reason, unless already terminal.
    fn mark_retry_pending(
        &self,
        id: i64,
        reason: &str,
    ) -> impl std::future::Future<Output = Result<bool, CentralError>> + Send;

    async fn mark_failed(&self, id: i64, reason: &str) -> Result<(), CentralError>;
}

/// Append-only upstream-link lifecycle events.
pub trait ConnectionLogRepository: Send + Sync {
    async fn record(&self, event: &str, detail: Option<&str>) -> Result<(), CentralError>;
}
